//! Environment mapping for converting variables → [`Settings`].
//!
//! This module is the single place where environment variable names are
//! mapped to struct fields. [`from_map`] is the testable core; callers in
//! production go through `Settings::from_env()`.

use std::collections::HashMap;
use std::path::PathBuf;

use super::settings::Settings;

/// Builds [`Settings`] from a key/value map.
///
/// Starts from `Settings::default()` and overlays any recognized variables.
/// Malformed numeric or boolean values fall back to the default for that
/// field; configuration never aborts startup.
pub fn from_map(vars: &HashMap<String, String>) -> Settings {
    let mut settings = Settings::default();

    let path = |key: &str| vars.get(key).map(|v| PathBuf::from(v.trim()));

    if let Some(v) = path("GEORAMA_IMAGE_ROOT") {
        settings.paths.image_root = v;
    }
    if let Some(v) = path("GEORAMA_GEOREF_ROOT") {
        settings.paths.georef_root = v;
    }
    if let Some(v) = path("GEORAMA_TMS_ROOT") {
        settings.paths.tms_root = v;
    }
    if let Some(v) = path("GEORAMA_MAPFILE_ROOT") {
        settings.paths.mapfile_root = v;
    }
    if let Some(v) = path("GEORAMA_THUMBNAIL_ROOT") {
        settings.paths.thumbnail_root = v;
    }
    if let Some(v) = path("GEORAMA_ZOOMIFY_ROOT") {
        settings.paths.zoomify_root = v;
    }
    if let Some(v) = path("GEORAMA_MOSAIC_ROOT") {
        settings.paths.mosaic_root = v;
    }
    if let Some(v) = path("GEORAMA_TMP_ROOT") {
        settings.paths.tmp_root = v;
    }

    if let Some(v) = vars.get("GEORAMA_ES_HOST") {
        settings.index.host = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_ES_PORT") {
        if let Ok(port) = v.trim().parse() {
            settings.index.port = port;
        }
    }
    if let Some(v) = vars.get("GEORAMA_ES_SSL") {
        settings.index.ssl = parse_bool(v).unwrap_or(settings.index.ssl);
    }
    if let Some(v) = vars.get("GEORAMA_ES_USERNAME") {
        let v = v.trim();
        if !v.is_empty() {
            settings.index.username = Some(v.to_string());
        }
    }
    if let Some(v) = vars.get("GEORAMA_ES_PASSWORD") {
        let v = v.trim();
        if !v.is_empty() {
            settings.index.password = Some(v.to_string());
        }
    }
    if let Some(v) = vars.get("GEORAMA_ES_INDEX_NAME") {
        settings.index.index_name = v.trim().to_string();
    }

    if let Some(v) = vars.get("GEORAMA_DB_URL") {
        settings.database.db_url = v.trim().to_string();
    }

    if let Some(v) = vars.get("GEORAMA_GDAL_CACHEMAX") {
        if let Ok(n) = v.trim().parse() {
            settings.gdal.cachemax = n;
        }
    }
    if let Some(v) = vars.get("GEORAMA_GDAL_NUM_THREADS") {
        if let Ok(n) = v.trim().parse() {
            settings.gdal.num_threads = n;
        }
    }
    if let Some(v) = vars.get("GEORAMA_GDAL_WARP_MEMORY") {
        if let Ok(n) = v.trim().parse() {
            settings.gdal.warp_memory = n;
        }
    }
    if let Some(v) = vars.get("GEORAMA_TMS_PROCESSES") {
        if let Ok(n) = v.trim().parse() {
            settings.gdal.tms_processes = n;
        }
    }

    if let Some(v) = vars.get("GEORAMA_WMS_URL_TEMPLATE") {
        settings.templates.wms_url_template = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_WCS_URL_TEMPLATE") {
        settings.templates.wcs_url_template = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_ZOOMIFY_URL_TEMPLATE") {
        settings.templates.zoomify_url_template = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_THUMBNAIL_URL_TEMPLATE") {
        settings.templates.thumbnail_url_template = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_TMS_URL_TEMPLATES") {
        let templates: Vec<String> = v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !templates.is_empty() {
            settings.templates.tms_url_templates = templates;
        }
    }
    if let Some(v) = vars.get("GEORAMA_MAP_ID_TEMPLATE") {
        settings.templates.map_id_template = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_MOSAIC_MAP_ID_TEMPLATE") {
        settings.templates.mosaic_map_id_template = v.trim().to_string();
    }
    if let Some(v) = vars.get("GEORAMA_GLOBAL_PERMALINK_RESOLVER") {
        settings.templates.global_permalink_resolver = v.trim().to_string();
    }

    settings
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_map_yields_defaults() {
        let settings = from_map(&HashMap::new());
        assert_eq!(settings.index.host, "localhost");
        assert_eq!(settings.index.port, 9200);
        assert!(!settings.index.ssl);
    }

    #[test]
    fn test_path_overrides() {
        let settings = from_map(&vars(&[
            ("GEORAMA_IMAGE_ROOT", "/srv/vk/original"),
            ("GEORAMA_TMP_ROOT", "/var/tmp/vk"),
        ]));
        assert_eq!(settings.paths.image_root, PathBuf::from("/srv/vk/original"));
        assert_eq!(settings.paths.tmp_root, PathBuf::from("/var/tmp/vk"));
        // untouched sections keep their defaults
        assert_eq!(settings.paths.georef_root, PathBuf::from("./data/georef"));
    }

    #[test]
    fn test_index_overrides() {
        let settings = from_map(&vars(&[
            ("GEORAMA_ES_HOST", "search.example.org"),
            ("GEORAMA_ES_PORT", "9443"),
            ("GEORAMA_ES_SSL", "true"),
            ("GEORAMA_ES_USERNAME", "svc"),
            ("GEORAMA_ES_PASSWORD", "secret"),
            ("GEORAMA_ES_INDEX_NAME", "vk_test"),
        ]));
        assert_eq!(settings.index.host, "search.example.org");
        assert_eq!(settings.index.port, 9443);
        assert!(settings.index.ssl);
        assert_eq!(settings.index.username.as_deref(), Some("svc"));
        assert_eq!(settings.index.index_name, "vk_test");
    }

    #[test]
    fn test_malformed_port_keeps_default() {
        let settings = from_map(&vars(&[("GEORAMA_ES_PORT", "not-a-port")]));
        assert_eq!(settings.index.port, 9200);
    }

    #[test]
    fn test_tms_url_templates_split() {
        let settings = from_map(&vars(&[(
            "GEORAMA_TMS_URL_TEMPLATES",
            "http://a.example.org/tms/{}, http://b.example.org/tms/{}",
        )]));
        assert_eq!(settings.templates.tms_url_templates.len(), 2);
        assert_eq!(
            settings.templates.tms_url_templates[1],
            "http://b.example.org/tms/{}"
        );
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
