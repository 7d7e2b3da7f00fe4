//! Test doubles for the raster toolchain.
//!
//! [`MockToolchain`] stands in for the external tools in unit and
//! integration tests: every write operation creates a small marker file (or
//! directory tree) at the declared target, and every call is recorded so
//! tests can assert on invocation order and arguments. Raster metadata
//! answers are configurable per path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Toolchain, ToolchainError};
use crate::geometry::BBox;
use crate::models::{Gcp, TransformAlgorithm};

/// Toolchain double that records calls and writes marker outputs.
#[derive(Debug, Default)]
pub struct MockToolchain {
    /// Every invocation, as `"op target"` strings, in order.
    pub calls: Mutex<Vec<String>>,
    /// EPSG answers by raster path; unknown paths answer 4326.
    pub epsg_by_path: Mutex<HashMap<PathBuf, i64>>,
    /// Extent answers by raster path; unknown paths answer a default box.
    pub extent_by_path: Mutex<HashMap<PathBuf, BBox>>,
    /// Operation names that must fail (e.g. "rectify").
    pub failing_ops: Mutex<Vec<String>>,
    /// When true, write operations succeed without producing output,
    /// which must trip the post-condition checks.
    pub skip_outputs: Mutex<bool>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_epsg(&self, raster: &Path, epsg: i64) {
        self.epsg_by_path
            .lock()
            .expect("lock")
            .insert(raster.to_path_buf(), epsg);
    }

    pub fn set_extent(&self, raster: &Path, extent: BBox) {
        self.extent_by_path
            .lock()
            .expect("lock")
            .insert(raster.to_path_buf(), extent);
    }

    pub fn fail_on(&self, op: &str) {
        self.failing_ops.lock().expect("lock").push(op.to_string());
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|call| call.starts_with(op))
            .count()
    }

    fn record(&self, op: &str, target: &Path) -> Result<(), ToolchainError> {
        self.calls
            .lock()
            .expect("lock")
            .push(format!("{} {}", op, target.display()));
        if self
            .failing_ops
            .lock()
            .expect("lock")
            .iter()
            .any(|f| f == op)
        {
            return Err(ToolchainError::Failed {
                tool: op.to_string(),
                exit_code: 1,
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn write_marker_file(&self, op: &str, target: &Path) -> Result<(), ToolchainError> {
        self.record(op, target)?;
        if *self.skip_outputs.lock().expect("lock") {
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, op.as_bytes())?;
        Ok(())
    }

    fn write_marker_dir(&self, op: &str, target: &Path) -> Result<(), ToolchainError> {
        self.record(op, target)?;
        if *self.skip_outputs.lock().expect("lock") {
            return Ok(());
        }
        fs::create_dir_all(target)?;
        fs::write(target.join(".marker"), op.as_bytes())?;
        Ok(())
    }
}

impl Toolchain for MockToolchain {
    fn translate_raw(
        &self,
        _source: &Path,
        target: &Path,
        _force_byte: bool,
    ) -> Result<(), ToolchainError> {
        self.write_marker_file("translate_raw", target)
    }

    fn rectify(
        &self,
        _source: &Path,
        target: &Path,
        _algorithm: TransformAlgorithm,
        gcps: &[Gcp],
        target_epsg: i64,
        clip: Option<&Path>,
        _tmp_dir: &Path,
    ) -> Result<(), ToolchainError> {
        self.calls.lock().expect("lock").push(format!(
            "rectify-args epsg={} gcps={} clip={}",
            target_epsg,
            gcps.len(),
            clip.is_some()
        ));
        self.write_marker_file("rectify", target)
    }

    fn build_tms(
        &self,
        _source: &Path,
        target_dir: &Path,
        _processes: u32,
        _map_scale: Option<i64>,
    ) -> Result<(), ToolchainError> {
        self.write_marker_dir("build_tms", target_dir)
    }

    fn build_zoomify(&self, _source: &Path, target_dir: &Path) -> Result<(), ToolchainError> {
        self.write_marker_dir("build_zoomify", target_dir)
    }

    fn thumbnail(
        &self,
        _source: &Path,
        target: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), ToolchainError> {
        self.write_marker_file(&format!("thumbnail[{}x{}]", width, height), target)
    }

    fn build_vrt(&self, _inputs_dir: &Path, target: &Path) -> Result<(), ToolchainError> {
        self.write_marker_file("build_vrt", target)
    }

    fn build_overviews(&self, dataset: &Path, _levels: &str) -> Result<(), ToolchainError> {
        let mut sidecar = dataset.as_os_str().to_os_string();
        sidecar.push(".ovr");
        self.write_marker_file("build_overviews", Path::new(&sidecar))
    }

    fn warp(&self, _source: &Path, target: &Path, target_epsg: i64) -> Result<(), ToolchainError> {
        self.write_marker_file(&format!("warp[{}]", target_epsg), target)
    }

    fn copy_tiled(&self, _source: &Path, target: &Path) -> Result<(), ToolchainError> {
        self.write_marker_file("copy_tiled", target)
    }

    fn get_image_size(&self, raster: &Path) -> Result<(u32, u32), ToolchainError> {
        self.record("get_image_size", raster)?;
        Ok((8000, 7000))
    }

    fn get_extent(&self, raster: &Path) -> Result<BBox, ToolchainError> {
        self.record("get_extent", raster)?;
        Ok(self
            .extent_by_path
            .lock()
            .expect("lock")
            .get(raster)
            .copied()
            .unwrap_or(BBox {
                minx: 14.6431112,
                miny: 50.7671757,
                maxx: 14.8489897,
                maxy: 50.9130298,
            }))
    }

    fn get_epsg(&self, raster: &Path) -> Result<Option<i64>, ToolchainError> {
        self.record("get_epsg", raster)?;
        Ok(Some(
            self.epsg_by_path
                .lock()
                .expect("lock")
                .get(raster)
                .copied()
                .unwrap_or(4326),
        ))
    }

    fn transform_points(
        &self,
        points: &[[f64; 2]],
        source_epsg: i64,
        target_epsg: i64,
    ) -> Result<Vec<[f64; 2]>, ToolchainError> {
        self.calls.lock().expect("lock").push(format!(
            "transform_points {}->{} n={}",
            source_epsg,
            target_epsg,
            points.len()
        ));
        // Identity transform keeps assertions simple; tests that care about
        // the request inspect the recorded source/target codes.
        Ok(points.to_vec())
    }
}
