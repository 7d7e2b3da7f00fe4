//! Zoomify image pyramid creation.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{expect_output, skip_or_clear_dir, ActionError};
use crate::toolchain::Toolchain;

/// Builds the Zoomify image pyramid for a source raster.
pub fn create_zoomify<T: Toolchain>(
    toolchain: &T,
    source: &Path,
    target_dir: &Path,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    if !source.exists() {
        warn!(source = %source.display(), "create_zoomify: source image missing");
        return Ok(None);
    }
    if skip_or_clear_dir(target_dir, force)? {
        return Ok(Some(target_dir.to_path_buf()));
    }

    toolchain.build_zoomify(source, target_dir)?;
    let output = expect_output(target_dir)?;
    info!(target = %output.display(), "created zoomify pyramid");
    Ok(Some(output))
}
