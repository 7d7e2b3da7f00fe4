//! Preprocessed raster creation.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{expect_output, skip_or_clear_file, ActionError};
use crate::toolchain::Toolchain;

/// Lands the preprocessed source raster at its derived path.
///
/// The source is translated to a baseline, untiled, band-interleaved TIFF;
/// 16-bit sources are rescaled to Byte.
pub fn create_raw<T: Toolchain>(
    toolchain: &T,
    source: &Path,
    target: &Path,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    if !source.exists() {
        warn!(source = %source.display(), "create_raw: source image missing");
        return Ok(None);
    }
    if skip_or_clear_file(target, force)? {
        return Ok(Some(target.to_path_buf()));
    }

    toolchain.translate_raw(source, target, false)?;
    let output = expect_output(target)?;
    info!(target = %output.display(), "created raw raster");
    Ok(Some(output))
}
