//! Raster toolchain façade.
//!
//! Typed wrappers over the external raster tools (format translator,
//! warper, tile pyramid builder, image pyramid tool, thumbnailer, virtual
//! raster stitcher, overview builder) plus the thin coordinate/metadata
//! façade (extent, image size, EPSG detection, point reprojection).
//!
//! Actions and the mosaic engine depend on the [`Toolchain`] trait, never on
//! concrete tools; tests substitute a mock that writes marker files. Every
//! operation is write-only to an explicit target path and fails with
//! [`ToolchainError`] when the underlying process reports a nonzero status
//! or the expected output is absent afterwards.
//!
//! All invocations are blocking. The job pipeline is single-threaded and
//! cooperative; no action is interrupted mid-way by another job.

mod command;
mod gdal;
pub mod testing;

pub use command::{ToolCommand, ToolOutput};
pub use gdal::{zoom_range_for_scale, GdalToolchain};

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geometry::BBox;
use crate::models::{Gcp, TransformAlgorithm};

/// Failure of an external raster tool.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// Tool exited with a nonzero status
    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    Failed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// Tool reported success but the expected output file is absent
    #[error("{tool} reported success but output {path} is missing")]
    MissingOutput { tool: String, path: PathBuf },

    /// Tool binary could not be started
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    /// Tool output could not be interpreted
    #[error("{tool} produced unparseable output: {message}")]
    Parse { tool: String, message: String },

    /// Filesystem error around an invocation
    #[error("toolchain I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability-level raster operations.
///
/// Temporary working files go under the caller-supplied temp directory and
/// are removed on every exit path (the caller owns the directory lifetime).
pub trait Toolchain: Send + Sync {
    /// Translates a source raster into a baseline, untiled,
    /// band-interleaved TIFF with volatile metadata tags cleared.
    ///
    /// 16-bit sources are rescaled 0..65535 → 0..255 Byte; `force_byte`
    /// requests the rescale regardless of the detected pixel type.
    fn translate_raw(
        &self,
        source: &Path,
        target: &Path,
        force_byte: bool,
    ) -> Result<(), ToolchainError>;

    /// Rectifies a raster against ground control points into `target_epsg`,
    /// producing a georectified TIFF with overviews. `clip`, when given, is
    /// a GeoJSON polygon file applied as a cutline.
    #[allow(clippy::too_many_arguments)]
    fn rectify(
        &self,
        source: &Path,
        target: &Path,
        algorithm: TransformAlgorithm,
        gcps: &[Gcp],
        target_epsg: i64,
        clip: Option<&Path>,
        tmp_dir: &Path,
    ) -> Result<(), ToolchainError>;

    /// Builds a z/x/y tile pyramid with compressed PNG tiles. The zoom
    /// range is derived from the map scale; a fully transparent 256×256
    /// base tile is synthesized at z0/0/0 if the builder omits it.
    fn build_tms(
        &self,
        source: &Path,
        target_dir: &Path,
        processes: u32,
        map_scale: Option<i64>,
    ) -> Result<(), ToolchainError>;

    /// Builds an image pyramid in Zoomify layout.
    fn build_zoomify(&self, source: &Path, target_dir: &Path) -> Result<(), ToolchainError>;

    /// Produces a JPEG thumbnail. A zero dimension preserves the aspect
    /// ratio; at least one dimension must be nonzero.
    fn thumbnail(
        &self,
        source: &Path,
        target: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), ToolchainError>;

    /// Stitches every `.tif` under `inputs_dir` (all in the same CRS) into
    /// a virtual raster with nodata 0, in alphabetic basename order.
    fn build_vrt(&self, inputs_dir: &Path, target: &Path) -> Result<(), ToolchainError>;

    /// Builds the sidecar overview pyramid (JPEG-compressed RGB) for a
    /// dataset at the given levels, deleting a stale sidecar first.
    fn build_overviews(&self, dataset: &Path, levels: &str) -> Result<(), ToolchainError>;

    /// Warps a raster into the given CRS, nearest-neighbor resampling,
    /// overwriting any prior target.
    fn warp(&self, source: &Path, target: &Path, target_epsg: i64) -> Result<(), ToolchainError>;

    /// Byte-copies a raster with tiled TIFF creation options.
    fn copy_tiled(&self, source: &Path, target: &Path) -> Result<(), ToolchainError>;

    /// Pixel dimensions `(width, height)` of a raster.
    fn get_image_size(&self, raster: &Path) -> Result<(u32, u32), ToolchainError>;

    /// WGS84 extent of a raster.
    fn get_extent(&self, raster: &Path) -> Result<BBox, ToolchainError>;

    /// Declared EPSG code of a raster, when one is recorded.
    fn get_epsg(&self, raster: &Path) -> Result<Option<i64>, ToolchainError>;

    /// Reprojects points between two coordinate reference systems.
    fn transform_points(
        &self,
        points: &[[f64; 2]],
        source_epsg: i64,
        target_epsg: i64,
    ) -> Result<Vec<[f64; 2]>, ToolchainError>;
}
