//! Active georectified product of a raw map.

use sqlx::FromRow;

/// The active georectified product for a raw map.
///
/// Exists iff a GeoTIFF exists on disk and a transformation has been
/// enabled. Disabling the active transformation deletes this row together
/// with the raster and its tile pyramid.
#[derive(Debug, Clone, FromRow)]
pub struct GeorefMap {
    /// Raw map this product belongs to (primary key)
    pub raw_map_id: i64,
    /// The enabled transformation
    pub transformation_id: i64,
    /// Serialized extent polygon (GeoJSON) of the rectified raster
    pub extent: Option<String>,
    /// Absolute path of the georectified raster
    pub raster_path: String,
}

impl GeorefMap {
    /// Parses the stored extent polygon.
    pub fn parsed_extent(&self) -> Option<crate::geometry::BBox> {
        let raw = self.extent.as_deref()?;
        let geojson: serde_json::Value = serde_json::from_str(raw).ok()?;
        crate::geometry::BBox::from_geojson_polygon(&geojson)
    }
}
