//! Georectification of a raw raster against a transformation.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info, warn};

use super::{expect_output, skip_or_clear_file, ActionError};
use crate::geometry::Clip;
use crate::models::{Gcp, Transformation};
use crate::toolchain::Toolchain;

/// Rectifies a raw raster into its georeferenced form.
///
/// Ground control points are reprojected into the transformation's target
/// CRS first so that a single CRS governs rectification, regardless of
/// whether the target was declared on the GCPs or on the transformation. A
/// clip polygon is applied as a cutline only when it passes validity rules.
pub fn create_geo<T: Toolchain>(
    toolchain: &T,
    source: &Path,
    target: &Path,
    transformation: &Transformation,
    tmp_dir: &Path,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    if !source.exists() {
        warn!(source = %source.display(), "create_geo: source raster missing");
        return Ok(None);
    }
    if skip_or_clear_file(target, force)? {
        return Ok(Some(target.to_path_buf()));
    }

    let params = transformation.parsed_params()?;
    let target_epsg = transformation.effective_target_crs()?;
    let gcps = align_gcps(toolchain, &params.gcps, params.target_epsg(), target_epsg)?;

    let clip_file = write_cutline(transformation, tmp_dir)?;

    toolchain.rectify(
        source,
        target,
        params.algorithm,
        &gcps,
        target_epsg,
        clip_file.as_deref(),
        tmp_dir,
    )?;

    if let Some(clip_file) = clip_file {
        let _ = fs::remove_file(clip_file);
    }

    let output = expect_output(target)?;
    info!(
        target = %output.display(),
        epsg = target_epsg,
        transformation_id = transformation.id,
        "created georectified raster"
    );
    Ok(Some(output))
}

/// Reprojects GCP world coordinates from `gcp_epsg` into `target_epsg` when
/// the two disagree.
fn align_gcps<T: Toolchain>(
    toolchain: &T,
    gcps: &[Gcp],
    gcp_epsg: i64,
    target_epsg: i64,
) -> Result<Vec<Gcp>, ActionError> {
    if gcp_epsg == target_epsg {
        return Ok(gcps.to_vec());
    }
    debug!(from = gcp_epsg, to = target_epsg, "reprojecting GCPs");
    let world: Vec<[f64; 2]> = gcps.iter().map(|gcp| gcp.target).collect();
    let reprojected = toolchain.transform_points(&world, gcp_epsg, target_epsg)?;
    Ok(gcps
        .iter()
        .zip(reprojected)
        .map(|(gcp, target)| Gcp {
            source: gcp.source,
            target,
        })
        .collect())
}

/// Materializes a valid clip polygon as a GeoJSON cutline file in the temp
/// directory. Returns `None` when no applicable clip exists.
fn write_cutline(
    transformation: &Transformation,
    tmp_dir: &Path,
) -> Result<Option<PathBuf>, ActionError> {
    let clip = Clip::from_stored(transformation.clip.as_deref());
    if matches!(clip, Clip::None) {
        return Ok(None);
    }
    if !clip.is_valid() {
        warn!(
            transformation_id = transformation.id,
            "clip polygon fails validity rules, rectifying without cutline"
        );
        return Ok(None);
    }
    let Some(mut geojson) = clip.to_geojson() else {
        return Ok(None);
    };
    if let Some(epsg) = Clip::stored_epsg(transformation.clip.as_deref()) {
        geojson["crs"] = json!({
            "type": "name",
            "properties": {"name": format!("EPSG:{}", epsg)}
        });
    }

    fs::create_dir_all(tmp_dir)?;
    let path = tmp_dir.join(format!("clip_{}.geojson", transformation.id));
    fs::write(&path, serde_json::to_vec(&geojson)?)?;
    Ok(Some(path))
}
