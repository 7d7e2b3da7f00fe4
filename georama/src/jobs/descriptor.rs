//! Job descriptor schemas.
//!
//! Each job row carries a JSON descriptor whose schema depends on the job
//! type. Descriptors are parsed at dispatch time; a malformed descriptor
//! fails the job without touching any store.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Metadata, MetadataUpdate, RawMap};

/// Malformed job descriptor.
#[derive(Debug, Error)]
#[error("invalid job descriptor: {0}")]
pub struct DescriptorError(#[from] serde_json::Error);

/// Parses a descriptor of the given schema.
pub fn parse<T>(raw: &str) -> Result<T, DescriptorError>
where
    T: serde::de::DeserializeOwned,
{
    Ok(serde_json::from_str(raw)?)
}

/// `MAPS_CREATE`: import a new sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsCreateDescriptor {
    /// Caller-assigned internal id
    pub map_id: i64,
    /// Absolute path of the uploaded source image
    pub file: PathBuf,
    pub metadata: IncomingMetadata,
}

/// Initial entity state carried by a `MAPS_CREATE` descriptor.
///
/// Mixes raw-map fields (type, scale, download flag, CRS) with descriptive
/// metadata; [`Self::raw_map`] and [`Self::metadata`] split it back apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMetadata {
    pub map_type: String,
    #[serde(default)]
    pub map_scale: Option<i64>,
    pub title: String,
    pub title_short: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub time_of_publication: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub link_thumb_small: Option<String>,
    #[serde(default)]
    pub link_thumb_mid: Option<String>,
    #[serde(default)]
    pub link_zoomify: Option<String>,
    #[serde(default)]
    pub allow_download: bool,
    #[serde(default)]
    pub default_crs: Option<i64>,
}

impl IncomingMetadata {
    /// The raw-map row this descriptor creates. The stored filename is the
    /// stringified internal id; the relative path derives from the type.
    pub fn raw_map(&self, map_id: i64) -> RawMap {
        let file_name = map_id.to_string();
        RawMap {
            id: map_id,
            rel_path: format!("{}/{}.tif", self.map_type.to_lowercase(), file_name),
            file_name,
            map_type: self.map_type.clone(),
            allow_download: self.allow_download,
            default_crs: self.default_crs,
            map_scale: self.map_scale,
            enabled: true,
        }
    }

    /// The metadata row this descriptor creates, short title clamped.
    pub fn metadata(&self, map_id: i64) -> Metadata {
        let mut metadata = Metadata {
            raw_map_id: map_id,
            title: self.title.clone(),
            title_short: self.title_short.clone(),
            description: self.description.clone(),
            license: self.license.clone(),
            time_of_publication: self.time_of_publication.clone(),
            owner: self.owner.clone(),
            link_thumb_small: self.link_thumb_small.clone(),
            link_thumb_mid: self.link_thumb_mid.clone(),
            link_zoomify: self.link_zoomify.clone(),
            permalink: None,
            ppn: None,
            technique: None,
        };
        metadata.clamp_title_short();
        metadata
    }
}

/// `MAPS_UPDATE`: replace the source image and/or patch metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsUpdateDescriptor {
    pub map_id: i64,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub metadata: Option<MetadataUpdate>,
}

/// `MAPS_DELETE`: retract a sheet and all derived artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsDeleteDescriptor {
    pub map_id: i64,
}

/// `MOSAIC_MAP_CREATE` / `MOSAIC_MAP_DELETE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicDescriptor {
    pub mosaic_map_id: i64,
}

/// `TRANSFORMATION_SET` / `TRANSFORMATION_PROCESS`: enable (default) or
/// retire the products of one transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationDescriptor {
    pub transformation_id: i64,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}
