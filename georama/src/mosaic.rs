//! Mosaic composition engine.
//!
//! A mosaic is a virtual raster stitched over per-sheet georectified
//! rasters that were first brought into a common CRS. The engine builds the
//! whole dataset tree under a caller-supplied directory; the mosaic
//! processor builds into scratch space and swaps the result in atomically.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::toolchain::{Toolchain, ToolchainError};

/// Overview levels built for mosaic datasets.
pub const DEFAULT_OVERVIEW_LEVELS: &str = "2 4 8 16 32 64 128";

/// Failure while composing a mosaic dataset.
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Composition produced no dataset
    #[error("mosaic dataset missing after composition: {path}")]
    MissingDataset { path: PathBuf },

    #[error("mosaic I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the complete dataset tree `target_dir / name` for a mosaic.
///
/// Each input raster is landed under `images/` with its original basename,
/// byte-copied when its CRS already matches `target_epsg` and warped
/// (nearest-neighbor) otherwise. Inputs are processed in list order; the
/// virtual raster composes them in alphabetic basename order. Returns the
/// dataset path `target_dir / name / name.vrt`.
pub fn build_dataset<T: Toolchain>(
    toolchain: &T,
    name: &str,
    target_dir: &Path,
    inputs: &[PathBuf],
    target_epsg: i64,
) -> Result<PathBuf, MosaicError> {
    let mosaic_dir = target_dir.join(name);
    let images_dir = mosaic_dir.join("images");
    fs::create_dir_all(&images_dir)?;

    for input in inputs {
        let Some(basename) = input.file_name() else {
            continue;
        };
        let landed = images_dir.join(basename);
        if landed.exists() {
            fs::remove_file(&landed)?;
        }
        match toolchain.get_epsg(input)? {
            Some(epsg) if epsg == target_epsg => {
                debug!(input = %input.display(), "CRS matches, copying");
                toolchain.copy_tiled(input, &landed)?;
            }
            _ => {
                debug!(input = %input.display(), target_epsg, "warping into target CRS");
                toolchain.warp(input, &landed, target_epsg)?;
            }
        }
    }

    let dataset = mosaic_dir.join(format!("{}.vrt", name));
    if dataset.exists() {
        fs::remove_file(&dataset)?;
    }
    toolchain.build_vrt(&images_dir, &dataset)?;
    if !dataset.exists() {
        return Err(MosaicError::MissingDataset { path: dataset });
    }
    info!(dataset = %dataset.display(), inputs = inputs.len(), "composed mosaic dataset");
    Ok(dataset)
}

/// Builds the sidecar overview pyramid for a composed dataset and returns
/// the `.ovr` path. A stale sidecar is removed by the overview builder.
pub fn build_dataset_overviews<T: Toolchain>(
    toolchain: &T,
    dataset: &Path,
    levels: &str,
) -> Result<PathBuf, MosaicError> {
    toolchain.build_overviews(dataset, levels)?;
    let mut os = dataset.as_os_str().to_os_string();
    os.push(".ovr");
    let sidecar = PathBuf::from(os);
    if !sidecar.exists() {
        return Err(MosaicError::MissingDataset { path: sidecar });
    }
    info!(sidecar = %sidecar.display(), "built mosaic overviews");
    Ok(sidecar)
}
