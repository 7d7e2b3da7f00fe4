//! Thumbnail rendering.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{expect_output, skip_or_clear_file, ActionError};
use crate::toolchain::Toolchain;

/// Renders a JPEG thumbnail of the source raster.
///
/// A zero width or height preserves the aspect ratio.
pub fn create_thumbnail<T: Toolchain>(
    toolchain: &T,
    source: &Path,
    target: &Path,
    width: u32,
    height: u32,
    force: bool,
) -> Result<Option<PathBuf>, ActionError> {
    if !source.exists() {
        warn!(source = %source.display(), "create_thumbnail: source image missing");
        return Ok(None);
    }
    if skip_or_clear_file(target, force)? {
        return Ok(Some(target.to_path_buf()));
    }

    toolchain.thumbnail(source, target, width, height)?;
    let output = expect_output(target)?;
    info!(target = %output.display(), width, height, "created thumbnail");
    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::testing::MockToolchain;
    use std::fs;

    #[test]
    fn test_creates_thumbnail_with_dimensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("42.tif");
        fs::write(&source, b"raster").expect("write");
        let target = dir.path().join("42_120x120.jpg");
        let toolchain = MockToolchain::new();

        let result =
            create_thumbnail(&toolchain, &source, &target, 120, 120, false).expect("action");
        assert_eq!(result, Some(target));
        assert_eq!(toolchain.call_count("thumbnail[120x120]"), 1);
    }

    #[test]
    fn test_missing_source_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toolchain = MockToolchain::new();
        let result = create_thumbnail(
            &toolchain,
            &dir.path().join("absent.tif"),
            &dir.path().join("out.jpg"),
            120,
            0,
            false,
        )
        .expect("action");
        assert!(result.is_none());
    }

    #[test]
    fn test_skip_if_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("42.tif");
        fs::write(&source, b"raster").expect("write");
        let target = dir.path().join("42_120x120.jpg");
        fs::write(&target, b"existing").expect("write");
        let toolchain = MockToolchain::new();

        create_thumbnail(&toolchain, &source, &target, 120, 120, false).expect("action");
        assert!(toolchain.recorded_calls().is_empty());
    }
}
