//! Deterministic artifact paths.
//!
//! Every derived product of a map has exactly one location, computed from
//! stable identifiers (map id, filename, map type, mosaic name). Actions and
//! processors never invent paths themselves; they ask the layout. This keeps
//! the filesystem subtrees owned by different actions disjoint.

use std::path::{Path, PathBuf};

use crate::config::PathSettings;

/// Path derivation for all derived artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    paths: PathSettings,
}

impl ArtifactLayout {
    /// Creates a layout over the configured filesystem roots.
    pub fn new(paths: PathSettings) -> Self {
        Self { paths }
    }

    /// Root of scratch space for per-job temp directories.
    pub fn tmp_root(&self) -> &Path {
        &self.paths.tmp_root
    }

    /// Raw source image: `image_root / map_type / file_name.tif`
    pub fn raw_image_path(&self, map_type: &str, file_name: &str) -> PathBuf {
        self.paths
            .image_root
            .join(map_type.to_lowercase())
            .join(format!("{}.tif", file_name))
    }

    /// Georectified raster: `georef_root / file_name.tif`
    pub fn georef_path(&self, file_name: &str) -> PathBuf {
        self.paths.georef_root.join(format!("{}.tif", file_name))
    }

    /// Tile pyramid directory: `tms_root / map_type / file_name`
    pub fn tms_dir(&self, map_type: &str, file_name: &str) -> PathBuf {
        self.paths
            .tms_root
            .join(map_type.to_lowercase())
            .join(file_name)
    }

    /// Map service definition: `mapfile_root / {map_id}.map`
    pub fn mapfile_path(&self, map_id: i64) -> PathBuf {
        self.paths.mapfile_root.join(format!("{}.map", map_id))
    }

    /// Thumbnail: `thumbnail_root / {map_id}_{W}x{H}.jpg`
    pub fn thumbnail_path(&self, map_id: i64, width: u32, height: u32) -> PathBuf {
        self.paths
            .thumbnail_root
            .join(format!("{}_{}x{}.jpg", map_id, width, height))
    }

    /// Image pyramid directory: `zoomify_root / {map_id}`
    pub fn zoomify_dir(&self, map_id: i64) -> PathBuf {
        self.paths.zoomify_root.join(map_id.to_string())
    }

    /// Mosaic dataset directory: `mosaic_root / name`
    pub fn mosaic_dir(&self, name: &str) -> PathBuf {
        self.paths.mosaic_root.join(name)
    }

    /// Mosaic dataset: `mosaic_root / name / name.vrt`
    pub fn mosaic_dataset_path(&self, name: &str) -> PathBuf {
        self.mosaic_dir(name).join(format!("{}.vrt", name))
    }

    /// Stitched mosaic inputs: `mosaic_root / name / images`
    pub fn mosaic_images_dir(&self, name: &str) -> PathBuf {
        self.mosaic_dir(name).join("images")
    }

    /// Mosaic map service definition: `mapfile_root / {name}.map`
    pub fn mosaic_mapfile_path(&self, name: &str) -> PathBuf {
        self.paths.mapfile_root.join(format!("{}.map", name))
    }

    /// Overview sidecar of a mosaic dataset: `<dataset>.ovr`
    pub fn mosaic_overview_path(&self, name: &str) -> PathBuf {
        let dataset = self.mosaic_dataset_path(name);
        let mut os = dataset.into_os_string();
        os.push(".ovr");
        PathBuf::from(os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn layout() -> ArtifactLayout {
        let mut paths = Settings::default().paths;
        paths.image_root = PathBuf::from("/srv/original");
        paths.georef_root = PathBuf::from("/srv/georef");
        paths.tms_root = PathBuf::from("/srv/tms");
        paths.mapfile_root = PathBuf::from("/srv/mapfiles");
        paths.thumbnail_root = PathBuf::from("/srv/thumbnails");
        paths.zoomify_root = PathBuf::from("/srv/zoomify");
        paths.mosaic_root = PathBuf::from("/srv/mosaics");
        ArtifactLayout::new(paths)
    }

    #[test]
    fn test_raw_image_path() {
        assert_eq!(
            layout().raw_image_path("mtb", "42"),
            PathBuf::from("/srv/original/mtb/42.tif")
        );
    }

    #[test]
    fn test_raw_image_path_lowercases_map_type() {
        assert_eq!(
            layout().raw_image_path("MTB", "42"),
            PathBuf::from("/srv/original/mtb/42.tif")
        );
    }

    #[test]
    fn test_georef_path() {
        assert_eq!(
            layout().georef_path("dd_stad_0000007"),
            PathBuf::from("/srv/georef/dd_stad_0000007.tif")
        );
    }

    #[test]
    fn test_tms_dir() {
        assert_eq!(
            layout().tms_dir("mtb", "dd_stad_0000007"),
            PathBuf::from("/srv/tms/mtb/dd_stad_0000007")
        );
    }

    #[test]
    fn test_mapfile_and_thumbnail() {
        assert_eq!(
            layout().mapfile_path(42),
            PathBuf::from("/srv/mapfiles/42.map")
        );
        assert_eq!(
            layout().thumbnail_path(42, 120, 120),
            PathBuf::from("/srv/thumbnails/42_120x120.jpg")
        );
        assert_eq!(layout().zoomify_dir(42), PathBuf::from("/srv/zoomify/42"));
    }

    #[test]
    fn test_mosaic_paths() {
        let l = layout();
        assert_eq!(
            l.mosaic_dataset_path("test_service"),
            PathBuf::from("/srv/mosaics/test_service/test_service.vrt")
        );
        assert_eq!(
            l.mosaic_images_dir("test_service"),
            PathBuf::from("/srv/mosaics/test_service/images")
        );
        assert_eq!(
            l.mosaic_mapfile_path("test_service"),
            PathBuf::from("/srv/mapfiles/test_service.map")
        );
        assert_eq!(
            l.mosaic_overview_path("test_service"),
            PathBuf::from("/srv/mosaics/test_service/test_service.vrt.ovr")
        );
    }
}
