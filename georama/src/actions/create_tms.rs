//! Tile pyramid creation with CRS validity handling.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{expect_output, skip_or_clear_dir, ActionError, BoundsError};
use crate::geometry::EPSG_4314_BOUNDS;
use crate::toolchain::Toolchain;

const DHDN_EPSG: i64 = 4314;
const WEB_MERCATOR_EPSG: i64 = 3857;

/// Builds the z/x/y tile pyramid for a georeferenced raster.
///
/// Rasters declared EPSG:4314 whose bounds leave the datum's validity box
/// are reprojected to EPSG:3857 first when the overflow is purely eastward.
/// Overflow in any other direction fails with [`BoundsError`]; tiling such a
/// raster would produce tiles at wrong positions.
pub fn create_tms<T: Toolchain>(
    toolchain: &T,
    source: &Path,
    target_dir: &Path,
    processes: u32,
    map_scale: Option<i64>,
    tmp_dir: &Path,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    if !source.exists() {
        warn!(source = %source.display(), "create_tms: source raster missing");
        return Ok(None);
    }
    if skip_or_clear_dir(target_dir, force)? {
        return Ok(Some(target_dir.to_path_buf()));
    }

    let mut tile_source = source.to_path_buf();
    if toolchain.get_epsg(source)? == Some(DHDN_EPSG) {
        let bbox = toolchain.get_extent(source)?;
        if !EPSG_4314_BOUNDS.contains(&bbox) {
            if !EPSG_4314_BOUNDS.overflows_only_east(&bbox) {
                return Err(BoundsError {
                    epsg: DHDN_EPSG,
                    bbox,
                }
                .into());
            }
            info!(source = %source.display(), "eastward overflow, reprojecting to web mercator");
            std::fs::create_dir_all(tmp_dir)?;
            let warped = tmp_dir.join(warped_name(source));
            toolchain.warp(source, &warped, WEB_MERCATOR_EPSG)?;
            tile_source = warped;
        }
    }

    toolchain.build_tms(&tile_source, target_dir, processes, map_scale)?;
    let output = expect_output(target_dir)?;
    info!(target = %output.display(), "created tile pyramid");
    Ok(Some(output))
}

fn warped_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    format!("{}_{}.tif", stem, WEB_MERCATOR_EPSG)
}
