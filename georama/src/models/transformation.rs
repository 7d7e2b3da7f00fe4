//! Georeferencing attempts for a raw map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single georeferencing attempt.
///
/// Many transformations may exist per raw map; at most one is active, the
/// one referenced by the map's [`crate::models::GeorefMap`].
#[derive(Debug, Clone, FromRow)]
pub struct Transformation {
    pub id: i64,
    /// The raw map this attempt georeferences
    pub raw_map_id: i64,
    /// Submitting user
    pub user_id: String,
    /// Submission time
    pub submitted: DateTime<Utc>,
    /// Serialized [`TransformationParams`] (JSON)
    pub params: String,
    /// Optional clip polygon, GeoJSON with a named CRS
    pub clip: Option<String>,
    /// Optional target CRS overriding the GCP target CRS (EPSG code)
    pub target_crs: Option<i64>,
    /// Validation state
    pub validation: ValidationState,
    /// How many times this attempt overwrote a previous one
    pub overwrites: i64,
    /// Optional submitter comment
    pub comment: Option<String>,
}

impl Transformation {
    /// Parses the serialized parameter block.
    pub fn parsed_params(&self) -> Result<TransformationParams, serde_json::Error> {
        serde_json::from_str(&self.params)
    }

    /// The CRS rectification targets: the explicit `target_crs` when set,
    /// otherwise the CRS named by the GCP parameter block.
    pub fn effective_target_crs(&self) -> Result<i64, serde_json::Error> {
        match self.target_crs {
            Some(crs) => Ok(crs),
            None => Ok(self.parsed_params()?.target_epsg()),
        }
    }
}

/// Validation state of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ValidationState {
    Missing,
    Valid,
    Invalid,
}

/// Rectification algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformAlgorithm {
    /// First-order polynomial (affine)
    Affine,
    /// Third-order polynomial
    Polynom,
    /// Thin plate spline
    Tps,
}

/// A ground control point: pixel coordinates paired with world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gcp {
    /// Pixel position in the source raster, `[col, row]`
    pub source: [f64; 2],
    /// World position in the target CRS, `[x, y]`
    pub target: [f64; 2],
}

/// The serialized parameter block of a transformation.
///
/// `source` is always the literal `"pixel"`; `target` names the CRS the GCP
/// world coordinates are expressed in, e.g. `"EPSG:4314"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationParams {
    pub source: String,
    pub target: String,
    pub algorithm: TransformAlgorithm,
    pub gcps: Vec<Gcp>,
}

impl TransformationParams {
    /// Numeric EPSG code of the GCP target CRS.
    ///
    /// Falls back to 4326 if the string is not of the form `EPSG:<int>`;
    /// stored parameter blocks are validated upstream.
    pub fn target_epsg(&self) -> i64 {
        self.target
            .rsplit(':')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4326)
    }
}
