//! Default values for all configuration settings.

use std::path::PathBuf;

use super::settings::*;

pub(super) const DEFAULT_ES_HOST: &str = "localhost";
pub(super) const DEFAULT_ES_PORT: u16 = 9200;
pub(super) const DEFAULT_ES_INDEX: &str = "vk20";
pub(super) const DEFAULT_DB_URL: &str = "sqlite://georama.db";

pub(super) const DEFAULT_GDAL_CACHEMAX: u32 = 500;
pub(super) const DEFAULT_GDAL_WARP_MEMORY: u32 = 500;

/// Default GDAL worker threads: number of CPU cores.
pub(super) fn default_gdal_threads() -> u32 {
    num_cpus() as u32
}

/// Default tile builder processes: number of CPU cores.
pub(super) fn default_tms_processes() -> u32 {
    num_cpus() as u32
}

/// Get the number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            index: IndexSettings::default(),
            database: DatabaseSettings::default(),
            gdal: GdalSettings::default(),
            templates: TemplateSettings::default(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        let data = PathBuf::from("./data");
        Self {
            image_root: data.join("original"),
            georef_root: data.join("georef"),
            tms_root: data.join("tms"),
            mapfile_root: data.join("mapfiles"),
            thumbnail_root: data.join("thumbnails"),
            zoomify_root: data.join("zoomify"),
            mosaic_root: data.join("mosaics"),
            tmp_root: data.join("tmp"),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_ES_HOST.to_string(),
            port: DEFAULT_ES_PORT,
            ssl: false,
            username: None,
            password: None,
            index_name: DEFAULT_ES_INDEX.to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
        }
    }
}

impl Default for GdalSettings {
    fn default() -> Self {
        Self {
            cachemax: DEFAULT_GDAL_CACHEMAX,
            num_threads: default_gdal_threads(),
            warp_memory: DEFAULT_GDAL_WARP_MEMORY,
            tms_processes: default_tms_processes(),
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            wms_url_template: "http://localhost/map/{}".to_string(),
            wcs_url_template: "http://localhost/wcs/{}".to_string(),
            zoomify_url_template: "http://localhost/zoomify/{}/ImageProperties.xml".to_string(),
            thumbnail_url_template: "http://localhost/thumbnails/{}.jpg".to_string(),
            tms_url_templates: vec!["http://localhost/tms/{}".to_string()],
            map_id_template: "oai:de:slub-dresden:vk:id-{}".to_string(),
            mosaic_map_id_template: "oai:de:slub-dresden:vk:mosaic:id-{}".to_string(),
            global_permalink_resolver: "http://digital.slub-dresden.de/".to_string(),
        }
    }
}
