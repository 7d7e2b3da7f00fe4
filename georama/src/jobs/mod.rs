//! Job pipeline: descriptor schemas, dispatcher loop and processors.
//!
//! Work enters the system as rows in the `jobs` table. The [`Dispatcher`]
//! drains them in submission order, single-threaded and cooperative, routing
//! each job to its processor:
//!
//! - `MAPS_CREATE` / `MAPS_UPDATE` / `MAPS_DELETE`: lifecycle of a single
//!   sheet and its derived artifacts
//! - `TRANSFORMATION_SET` / `TRANSFORMATION_PROCESS`: enable or retire the
//!   georeference products of one transformation
//! - `MOSAIC_MAP_CREATE` / `MOSAIC_MAP_DELETE`: composed mosaic datasets
//!
//! A processor failure marks the job `FAILED` with the error class recorded
//! on the row; the loop continues with the next job.

pub mod descriptor;
pub mod dispatcher;

mod maps_create;
mod maps_delete;
mod maps_update;
mod mosaic_create;
mod mosaic_delete;
mod transformation;

pub use descriptor::{
    DescriptorError, IncomingMetadata, MapsCreateDescriptor, MapsDeleteDescriptor,
    MapsUpdateDescriptor, MosaicDescriptor, TransformationDescriptor,
};
pub use dispatcher::Dispatcher;

use std::path::PathBuf;
use thiserror::Error;

use crate::actions::ActionError;
use crate::mosaic::MosaicError;
use crate::search::IndexError;
use crate::toolchain::ToolchainError;

/// The store left holding stale state after a partial multi-store change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleStore {
    /// The database change did not go through; files and index are ahead
    Database,
    /// The database committed; files and/or index still hold the old state
    Filesystem,
}

impl std::fmt::Display for StaleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database => f.write_str("database"),
            Self::Filesystem => f.write_str("filesystem"),
        }
    }
}

/// Failure of a job processor.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// A referenced entity or required artifact does not exist
    #[error("{entity} {id} not found")]
    MissingEntity { entity: &'static str, id: i64 },

    /// Required source artifact absent on disk
    #[error("required input missing: {path}")]
    MissingInput { path: PathBuf },

    /// A delete left the stores inconsistent; names the stale side
    #[error("stores out of sync for map {map_id}, stale {stale}: {source}")]
    OutOfSync {
        map_id: i64,
        stale: StaleStore,
        #[source]
        source: Box<JobError>,
    },

    #[error("job I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Short error class recorded on the failed job row.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Descriptor(_) => "DescriptorError",
            Self::Action(_) => "ActionError",
            Self::Mosaic(_) => "MosaicError",
            Self::Toolchain(_) => "ToolchainError",
            Self::Index(_) => "IndexError",
            Self::Db(_) => "DatabaseError",
            Self::MissingEntity { .. } => "MissingEntity",
            Self::MissingInput { .. } => "MissingInput",
            Self::OutOfSync { .. } => "OutOfSync",
            Self::Io(_) => "IoError",
        }
    }
}
