//! Map service definition emission.
//!
//! Service files are static text consumed by an external renderer. The
//! pipeline only substitutes the layer name, the raster data path and the
//! published endpoint URL into a fixed template; everything else about the
//! rendering setup lives in the template.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{expect_output, skip_or_clear_file, ActionError};

const MAPFILE_TEMPLATE: &str = r#"MAP
  NAME "{layer}"
  STATUS ON
  UNITS DD
  EXTENT -180 -90 180 90
  PROJECTION
    "init=epsg:4326"
  END
  WEB
    METADATA
      "wms_title" "{layer}"
      "wms_onlineresource" "{url}"
      "wms_srs" "EPSG:4326 EPSG:3857 EPSG:4314"
      "wms_enable_request" "*"
{wcs_metadata}    END
  END
  LAYER
    NAME "{layer}"
    TYPE RASTER
    STATUS ON
    DATA "{data}"
    PROJECTION
      AUTO
    END
{wcs_layer}  END
END
"#;

const WCS_WEB_METADATA: &str = r#"      "wcs_label" "{layer}"
      "wcs_onlineresource" "{url}"
      "wcs_enable_request" "*"
"#;

const WCS_LAYER_METADATA: &str = r#"    METADATA
      "wcs_label" "{layer}"
      "wcs_rangeset_name" "Range 1"
      "wcs_rangeset_label" "Bands"
    END
"#;

/// Writes the map service file for a single layer.
///
/// `with_wcs` additionally enables the coverage service, which is how
/// download access to the full-resolution raster is granted.
pub fn create_services(
    target: &Path,
    layer_name: &str,
    data: &Path,
    service_url: &str,
    with_wcs: bool,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    if !data.exists() {
        warn!(data = %data.display(), "create_services: raster missing, no service written");
        return Ok(None);
    }
    if skip_or_clear_file(target, force)? {
        return Ok(Some(target.to_path_buf()));
    }

    fs::write(target, render(layer_name, data, service_url, with_wcs))?;
    let output = expect_output(target)?;
    info!(target = %output.display(), layer = layer_name, wcs = with_wcs, "wrote map service file");
    Ok(Some(output))
}

/// Writes the map service file for a mosaic dataset. Mosaics publish WMS
/// only; the stitched virtual raster is not offered for download.
pub fn create_mosaic_services(
    target: &Path,
    name: &str,
    dataset: &Path,
    service_url: &str,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    create_services(target, name, dataset, service_url, false, force)
}

fn render(layer_name: &str, data: &Path, service_url: &str, with_wcs: bool) -> String {
    let (wcs_metadata, wcs_layer) = if with_wcs {
        (WCS_WEB_METADATA, WCS_LAYER_METADATA)
    } else {
        ("", "")
    };
    MAPFILE_TEMPLATE
        .replace("{wcs_metadata}", wcs_metadata)
        .replace("{wcs_layer}", wcs_layer)
        .replace("{layer}", layer_name)
        .replace("{data}", &data.display().to_string())
        .replace("{url}", service_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_wms_only_service() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("42.tif");
        fs::write(&data, b"raster").expect("write");
        let target = dir.path().join("42.map");

        let result = create_services(
            &target,
            "42",
            &data,
            "https://vk.example.org/wms/42",
            false,
            false,
        )
        .expect("action");
        assert_eq!(result, Some(target.clone()));

        let content = fs::read_to_string(&target).expect("read");
        assert!(content.contains(r#"NAME "42""#));
        assert!(content.contains(&data.display().to_string()));
        assert!(content.contains("https://vk.example.org/wms/42"));
        assert!(!content.contains("wcs_"));
    }

    #[test]
    fn test_with_wcs_emits_coverage_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("42.tif");
        fs::write(&data, b"raster").expect("write");
        let target = dir.path().join("42.map");

        create_services(
            &target,
            "42",
            &data,
            "https://vk.example.org/wms/42",
            true,
            false,
        )
        .expect("action");
        let content = fs::read_to_string(&target).expect("read");
        assert!(content.contains("wcs_enable_request"));
        assert!(content.contains("wcs_rangeset_name"));
    }

    #[test]
    fn test_missing_raster_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("42.map");
        let result = create_services(
            &target,
            "42",
            &dir.path().join("absent.tif"),
            "https://vk.example.org/wms/42",
            false,
            false,
        )
        .expect("action");
        assert!(result.is_none());
        assert!(!target.exists());
    }

    #[test]
    fn test_mosaic_service_never_has_wcs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset = dir.path().join("test_service.vrt");
        fs::write(&dataset, b"vrt").expect("write");
        let target = dir.path().join("test_service.map");

        create_mosaic_services(
            &target,
            "test_service",
            &dataset,
            "https://vk.example.org/wms/test_service",
            false,
        )
        .expect("action");
        let content = fs::read_to_string(&target).expect("read");
        assert!(content.contains(r#"NAME "test_service""#));
        assert!(!content.contains("wcs_"));
    }

    #[test]
    fn test_skip_if_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("42.tif");
        fs::write(&data, b"raster").expect("write");
        let target = dir.path().join("42.map");
        fs::write(&target, b"existing").expect("write");

        create_services(&target, "42", &data, "url", false, false).expect("action");
        assert_eq!(fs::read(&target).expect("read"), b"existing");
    }
}
