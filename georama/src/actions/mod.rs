//! Idempotent leaf operations.
//!
//! Every action obeys four contracts:
//!
//! 1. **Skip-if-present**: if the declared output exists and `force` is
//!    false, return the path without side effects.
//! 2. **Force**: if `force` is true, any existing output is removed before
//!    work starts.
//! 3. **Missing-input**: if a required input file is missing, return
//!    `Ok(None)`; composition decides what that means, the action only
//!    logs it.
//! 4. **Post-condition**: on success the output exists, otherwise the
//!    action fails with [`ActionError::MissingOutput`].
//!
//! Together these make every create path safe to re-run, which is what the
//! reconciler and manual job resubmission rely on.

mod create_geo;
mod create_raw;
mod create_services;
mod create_tms;
mod create_thumbnail;
mod create_zoomify;
mod update_index;

pub use create_geo::create_geo;
pub use create_raw::create_raw;
pub use create_services::{create_mosaic_services, create_services};
pub use create_tms::create_tms;
pub use create_thumbnail::create_thumbnail;
pub use create_zoomify::create_zoomify;
pub use update_index::{update_index, update_mosaic_index};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::geometry::BBox;
use crate::search::IndexError;
use crate::toolchain::ToolchainError;

/// Raster bounds outside what its declared CRS allows, and not recoverable
/// by eastward reprojection.
#[derive(Debug, Error)]
#[error("raster bbox {bbox:?} exceeds the validity box of EPSG:{epsg} in a non-eastward direction")]
pub struct BoundsError {
    pub epsg: i64,
    pub bbox: BBox,
}

/// Failure of a leaf action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Post-condition violation: the tool looked successful but the output
    /// is not there
    #[error("action output missing: {path}")]
    MissingOutput { path: PathBuf },

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// Stored parameter block or clip could not be parsed
    #[error("invalid stored parameters: {0}")]
    Params(#[from] serde_json::Error),

    #[error("action I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Applies the skip-if-present and force contracts to a file target.
///
/// Returns true when the caller should skip the work entirely.
pub(crate) fn skip_or_clear_file(target: &Path, force: bool) -> Result<bool, ActionError> {
    if target.exists() {
        if !force {
            debug!(target = %target.display(), "output present, skipping");
            return Ok(true);
        }
        fs::remove_file(target)?;
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(false)
}

/// Applies the skip-if-present and force contracts to a directory target.
pub(crate) fn skip_or_clear_dir(target: &Path, force: bool) -> Result<bool, ActionError> {
    if target.exists() {
        if !force {
            debug!(target = %target.display(), "output present, skipping");
            return Ok(true);
        }
        fs::remove_dir_all(target)?;
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(false)
}

/// Post-condition check shared by all actions.
pub(crate) fn expect_output(path: &Path) -> Result<PathBuf, ActionError> {
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        Err(ActionError::MissingOutput {
            path: path.to_path_buf(),
        })
    }
}
