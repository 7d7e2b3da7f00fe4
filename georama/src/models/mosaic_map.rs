//! Composite mosaic map record.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A composite of multiple raw maps, stitched into one dataset.
#[derive(Debug, Clone, FromRow)]
pub struct MosaicMap {
    pub id: i64,
    /// Name used in filesystem paths and as the service layer name
    pub name: String,
    /// Member raw map ids, JSON array, in composition order
    pub raw_map_ids: String,
    pub title: String,
    pub title_short: String,
    /// Publication time of the mosaic
    pub time_of_publication: DateTime<Utc>,
    /// Thumbnail URL
    pub link_thumb: Option<String>,
    /// Map scale denominator of the composite
    pub map_scale: Option<i64>,
    /// Last change to the mosaic definition
    pub last_change: DateTime<Utc>,
    /// Last successful service (re)build
    pub last_service_update: Option<DateTime<Utc>>,
    /// Last successful overview (re)build
    pub last_overview_update: Option<DateTime<Utc>>,
}

impl MosaicMap {
    /// Member ids in composition order, deduplicated preserving the first
    /// occurrence. A sheet listed twice contributes a single image.
    pub fn member_ids(&self) -> Vec<i64> {
        let ids: Vec<i64> = serde_json::from_str(&self.raw_map_ids).unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        ids.into_iter().filter(|id| seen.insert(*id)).collect()
    }
}
