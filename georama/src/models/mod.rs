//! Entity record types.
//!
//! One concrete struct per persisted entity. The database exclusively owns
//! entity state; the filesystem owns derived artifacts; the search index is
//! a replaceable projection. Serialized columns (transformation parameters,
//! clip polygons, extents) are JSON text and have typed accessors here.

mod georef_map;
mod job;
mod metadata;
mod mosaic_map;
mod raw_map;
mod transformation;

pub use georef_map::GeorefMap;
pub use job::{Job, JobState, JobType};
pub use metadata::{Metadata, MetadataUpdate, TITLE_SHORT_MAX};
pub use mosaic_map::MosaicMap;
pub use raw_map::RawMap;
pub use transformation::{
    Gcp, TransformAlgorithm, Transformation, TransformationParams, ValidationState,
};
