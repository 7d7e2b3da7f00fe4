//! Settings structs for all configuration sections.
//!
//! Each struct covers one concern of the pipeline. These are pure data
//! types with no parsing logic; see [`super::parser`] for the environment
//! mapping and [`super::defaults`] for fallback values.

use std::path::PathBuf;

/// Complete pipeline configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Filesystem roots for every derived artifact class
    pub paths: PathSettings,
    /// Search index connection and naming
    pub index: IndexSettings,
    /// Relational database connection
    pub database: DatabaseSettings,
    /// External raster toolchain tuning
    pub gdal: GdalSettings,
    /// URL and public-id templates for published resources
    pub templates: TemplateSettings,
}

/// Filesystem roots.
///
/// Every derived artifact lives under exactly one of these roots; the
/// deterministic layout is in [`crate::layout::ArtifactLayout`].
#[derive(Debug, Clone)]
pub struct PathSettings {
    /// Root of imported source images, organized by map type
    pub image_root: PathBuf,
    /// Root of georectified GeoTIFFs
    pub georef_root: PathBuf,
    /// Root of tile pyramid trees
    pub tms_root: PathBuf,
    /// Root of map service definition files
    pub mapfile_root: PathBuf,
    /// Root of generated thumbnails
    pub thumbnail_root: PathBuf,
    /// Root of image pyramids (Zoomify layout)
    pub zoomify_root: PathBuf,
    /// Root of mosaic datasets
    pub mosaic_root: PathBuf,
    /// Scratch space; each mosaic job creates a uniquely named subdirectory
    pub tmp_root: PathBuf,
}

/// Search index connection.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Index host name
    pub host: String,
    /// Index port
    pub port: u16,
    /// Use https when true
    pub ssl: bool,
    /// Basic-auth username, if the index requires authentication
    pub username: Option<String>,
    /// Basic-auth password
    pub password: Option<String>,
    /// Name of the document index
    pub index_name: String,
}

impl IndexSettings {
    /// Base URL of the index service, e.g. `https://search.example.org:9200`.
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Relational database connection.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// sqlx connection URL, e.g. `sqlite://georama.db`
    pub db_url: String,
}

/// External raster toolchain tuning.
#[derive(Debug, Clone)]
pub struct GdalSettings {
    /// GDAL block cache ceiling in megabytes (GDAL_CACHEMAX)
    pub cachemax: u32,
    /// Worker thread count passed to warp operations (GDAL_NUM_THREADS)
    pub num_threads: u32,
    /// Warp memory limit in megabytes
    pub warp_memory: u32,
    /// Process count hint for the tile pyramid builder
    pub tms_processes: u32,
}

/// URL and public-id templates.
///
/// Templates contain a single `{}` placeholder which is substituted with the
/// relevant value (integer id, filename or layer name).
#[derive(Debug, Clone)]
pub struct TemplateSettings {
    /// WMS endpoint template, placeholder = internal map id
    pub wms_url_template: String,
    /// WCS endpoint template, placeholder = internal map id
    pub wcs_url_template: String,
    /// Image pyramid URL template, placeholder = internal map id
    pub zoomify_url_template: String,
    /// Thumbnail URL template, placeholder = `{id}_{WxH}` file stem
    pub thumbnail_url_template: String,
    /// Tile pyramid URL templates, placeholder = `{map_type}/{file_name}`
    pub tms_url_templates: Vec<String>,
    /// Public id template for single sheets, placeholder = internal id
    pub map_id_template: String,
    /// Public id template for mosaics, placeholder = internal id
    pub mosaic_map_id_template: String,
    /// Permalink resolver prefix; the map permalink is this plus the public id
    pub global_permalink_resolver: String,
}

impl TemplateSettings {
    /// Substitutes `value` into a single-placeholder template.
    pub fn fill(template: &str, value: &str) -> String {
        template.replacen("{}", value, 1)
    }
}
