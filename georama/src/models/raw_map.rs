//! Imported source image record.

use sqlx::FromRow;

/// An imported source image.
///
/// The invariant for enabled maps is that a raw image file exists at
/// `image_root / map_type / file_name.tif`.
#[derive(Debug, Clone, FromRow)]
pub struct RawMap {
    /// Internal integer id; also the public id payload
    pub id: i64,
    /// Filename without extension; derived artifacts reuse it
    pub file_name: String,
    /// Relative path under the image root
    pub rel_path: String,
    /// Categorical map type (e.g. "mtb", "ae"); lowercased in paths
    pub map_type: String,
    /// Whether the source raster may be offered for download
    pub allow_download: bool,
    /// Declared CRS of the source, when known (EPSG code)
    pub default_crs: Option<i64>,
    /// Map scale denominator, when known
    pub map_scale: Option<i64>,
    /// Whether the map participates in the pipeline
    pub enabled: bool,
}

impl RawMap {
    /// Relative path of the raw image under the image root.
    pub fn relative_image_path(&self) -> String {
        format!("{}/{}.tif", self.map_type.to_lowercase(), self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_image_path() {
        let map = RawMap {
            id: 42,
            file_name: "42".to_string(),
            rel_path: "mtb/42.tif".to_string(),
            map_type: "MTB".to_string(),
            allow_download: true,
            default_crs: Some(4314),
            map_scale: Some(25000),
            enabled: true,
        };
        assert_eq!(map.relative_image_path(), "mtb/42.tif");
    }
}
