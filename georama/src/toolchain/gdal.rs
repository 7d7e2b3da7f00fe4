//! GDAL-backed implementation of the raster toolchain.
//!
//! Tool inventory: `gdal_translate` (translate, thumbnail, tiled copy),
//! `gdalwarp` (rectify, warp), `gdal2tiles.py` (tile pyramid),
//! `zoomify` (image pyramid), `gdalbuildvrt` (virtual raster),
//! `gdaladdo` (overviews), `gdalinfo -json` (metadata), `gdaltransform`
//! (point reprojection).

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::command::ToolCommand;
use super::{Toolchain, ToolchainError};
use crate::config::GdalSettings;
use crate::geometry::BBox;
use crate::models::{Gcp, TransformAlgorithm};

/// Production toolchain invoking the GDAL binaries.
#[derive(Debug, Clone)]
pub struct GdalToolchain {
    settings: GdalSettings,
}

/// Tile pyramid zoom range for a map scale denominator.
///
/// 0–17 up to 1:5000, 0–16 up to 1:15000, 0–10 from 1:10M upward,
/// 0–15 for everything else including unknown scales.
pub fn zoom_range_for_scale(map_scale: Option<i64>) -> (u8, u8) {
    match map_scale {
        Some(scale) if scale <= 5_000 => (0, 17),
        Some(scale) if scale <= 15_000 => (0, 16),
        Some(scale) if scale >= 10_000_000 => (0, 10),
        _ => (0, 15),
    }
}

impl GdalToolchain {
    pub fn new(settings: GdalSettings) -> Self {
        Self { settings }
    }

    /// Shared `--config` tuning for cache-heavy operations.
    fn tuned(&self, command: ToolCommand) -> ToolCommand {
        command
            .env("GDAL_CACHEMAX", self.settings.cachemax.to_string())
            .env("GDAL_NUM_THREADS", self.settings.num_threads.to_string())
    }

    /// Post-condition shared by all write operations.
    fn expect_output(tool: &str, path: &Path) -> Result<(), ToolchainError> {
        if path.exists() {
            Ok(())
        } else {
            Err(ToolchainError::MissingOutput {
                tool: tool.to_string(),
                path: path.to_path_buf(),
            })
        }
    }

    fn info_json(&self, raster: &Path) -> Result<serde_json::Value, ToolchainError> {
        let output = ToolCommand::new("gdalinfo")
            .arg("-json")
            .arg_path(raster)
            .run()?;
        serde_json::from_str(&output.stdout).map_err(|e| ToolchainError::Parse {
            tool: "gdalinfo".to_string(),
            message: e.to_string(),
        })
    }
}

impl Toolchain for GdalToolchain {
    fn translate_raw(
        &self,
        source: &Path,
        target: &Path,
        force_byte: bool,
    ) -> Result<(), ToolchainError> {
        let sixteen_bit = matches!(
            detect_pixel_type(&self.info_json(source)?).as_deref(),
            Some("UInt16") | Some("Int16")
        );

        let mut command = ToolCommand::new("gdal_translate")
            .args(["-of", "GTiff"])
            .args(["-co", "TILED=NO"])
            .args(["-co", "INTERLEAVE=BAND"])
            .args(["-co", "COMPRESS=NONE"])
            // volatile scanner metadata has no place in derived products
            .args(["-mo", "TIFFTAG_SOFTWARE="])
            .args(["-mo", "TIFFTAG_DATETIME="]);
        if sixteen_bit || force_byte {
            command = command
                .args(["-ot", "Byte"])
                .args(["-scale", "0", "65535", "0", "255"]);
        }
        command.arg_path(source).arg_path(target).run()?;
        Self::expect_output("gdal_translate", target)
    }

    fn rectify(
        &self,
        source: &Path,
        target: &Path,
        algorithm: TransformAlgorithm,
        gcps: &[Gcp],
        target_epsg: i64,
        clip: Option<&Path>,
        tmp_dir: &Path,
    ) -> Result<(), ToolchainError> {
        // Stage 1: attach GCPs to a temporary copy.
        let gcp_stage = tmp_dir.join("gcps.tif");
        let mut translate = ToolCommand::new("gdal_translate").args(["-of", "GTiff"]);
        for gcp in gcps {
            translate = translate.arg("-gcp").args([
                gcp.source[0].to_string(),
                gcp.source[1].to_string(),
                gcp.target[0].to_string(),
                gcp.target[1].to_string(),
            ]);
        }
        translate
            .args(["-a_srs", &format!("EPSG:{}", target_epsg)])
            .arg_path(source)
            .arg_path(&gcp_stage)
            .run()?;
        Self::expect_output("gdal_translate", &gcp_stage)?;

        // Stage 2: warp into the target CRS.
        let mut warp = self
            .tuned(ToolCommand::new("gdalwarp"))
            .args(["-r", "near"])
            .args(["-t_srs", &format!("EPSG:{}", target_epsg)])
            .args(["-wm", &self.settings.warp_memory.to_string()])
            .args(["-co", "COMPRESS=DEFLATE"])
            .arg("-overwrite")
            .arg("-dstalpha");
        warp = match algorithm {
            TransformAlgorithm::Affine => warp.args(["-order", "1"]),
            TransformAlgorithm::Polynom => warp.args(["-order", "3"]),
            TransformAlgorithm::Tps => warp.arg("-tps"),
        };
        if let Some(clip) = clip {
            warp = warp
                .arg("-cutline")
                .arg_path(clip)
                .arg("-crop_to_cutline");
        }
        let result = warp.arg_path(&gcp_stage).arg_path(target).run();
        // The staged copy is scratch either way.
        let _ = fs::remove_file(&gcp_stage);
        result?;
        Self::expect_output("gdalwarp", target)?;

        // Stage 3: internal overviews for fast rendering.
        ToolCommand::new("gdaladdo")
            .arg_path(target)
            .args(["2", "4", "8", "16"])
            .run()?;
        info!(target = %target.display(), epsg = target_epsg, "rectified raster");
        Ok(())
    }

    fn build_tms(
        &self,
        source: &Path,
        target_dir: &Path,
        processes: u32,
        map_scale: Option<i64>,
    ) -> Result<(), ToolchainError> {
        let (min_zoom, max_zoom) = zoom_range_for_scale(map_scale);
        fs::create_dir_all(target_dir)?;
        self.tuned(ToolCommand::new("gdal2tiles.py"))
            .arg(format!("--zoom={}-{}", min_zoom, max_zoom))
            .arg(format!("--processes={}", processes))
            .args(["--webviewer", "none"])
            .arg("--resume")
            .arg_path(source)
            .arg_path(target_dir)
            .run()?;
        ensure_base_tile(target_dir)?;
        Self::expect_output("gdal2tiles.py", target_dir)
    }

    fn build_zoomify(&self, source: &Path, target_dir: &Path) -> Result<(), ToolchainError> {
        fs::create_dir_all(target_dir)?;
        ToolCommand::new("zoomify")
            .arg_path(source)
            .arg_path(target_dir)
            .run()?;
        Self::expect_output("zoomify", target_dir)
    }

    fn thumbnail(
        &self,
        source: &Path,
        target: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), ToolchainError> {
        if width == 0 && height == 0 {
            return Err(ToolchainError::Parse {
                tool: "gdal_translate".to_string(),
                message: "thumbnail needs at least one nonzero dimension".to_string(),
            });
        }
        ToolCommand::new("gdal_translate")
            .args(["-of", "JPEG"])
            .args(["-outsize", &width.to_string(), &height.to_string()])
            .arg_path(source)
            .arg_path(target)
            .run()?;
        Self::expect_output("gdal_translate", target)
    }

    fn build_vrt(&self, inputs_dir: &Path, target: &Path) -> Result<(), ToolchainError> {
        let mut inputs: Vec<_> = fs::read_dir(inputs_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == "tif").unwrap_or(false))
            .collect();
        // Composition order is the alphabetic order of basenames.
        inputs.sort();

        let mut command = ToolCommand::new("gdalbuildvrt")
            .args(["-srcnodata", "0"])
            .args(["-vrtnodata", "0"])
            .arg("-overwrite")
            .arg_path(target);
        for input in &inputs {
            command = command.arg_path(input);
        }
        command.run()?;
        Self::expect_output("gdalbuildvrt", target)
    }

    fn build_overviews(&self, dataset: &Path, levels: &str) -> Result<(), ToolchainError> {
        let mut sidecar = dataset.as_os_str().to_os_string();
        sidecar.push(".ovr");
        let sidecar = Path::new(&sidecar);
        if sidecar.exists() {
            debug!(sidecar = %sidecar.display(), "removing stale overview sidecar");
            fs::remove_file(sidecar)?;
        }

        self.tuned(ToolCommand::new("gdaladdo"))
            .env("COMPRESS_OVERVIEW", "JPEG")
            .env("PHOTOMETRIC_OVERVIEW", "RGB")
            .env("INTERLEAVE_OVERVIEW", "PIXEL")
            .arg("-ro")
            .arg_path(dataset)
            .args(levels.split_whitespace().map(str::to_string))
            .run()?;
        Self::expect_output("gdaladdo", sidecar)
    }

    fn warp(&self, source: &Path, target: &Path, target_epsg: i64) -> Result<(), ToolchainError> {
        self.tuned(ToolCommand::new("gdalwarp"))
            .args(["-t_srs", &format!("EPSG:{}", target_epsg)])
            .args(["-r", "near"])
            .args(["-wm", &self.settings.warp_memory.to_string()])
            .arg("-multi")
            .arg("-overwrite")
            .arg_path(source)
            .arg_path(target)
            .run()?;
        Self::expect_output("gdalwarp", target)
    }

    fn copy_tiled(&self, source: &Path, target: &Path) -> Result<(), ToolchainError> {
        ToolCommand::new("gdal_translate")
            .args(["-co", "TILED=YES"])
            .arg_path(source)
            .arg_path(target)
            .run()?;
        Self::expect_output("gdal_translate", target)
    }

    fn get_image_size(&self, raster: &Path) -> Result<(u32, u32), ToolchainError> {
        let info = self.info_json(raster)?;
        parse_size(&info).ok_or_else(|| ToolchainError::Parse {
            tool: "gdalinfo".to_string(),
            message: "no size field".to_string(),
        })
    }

    fn get_extent(&self, raster: &Path) -> Result<BBox, ToolchainError> {
        let info = self.info_json(raster)?;
        parse_wgs84_extent(&info).ok_or_else(|| ToolchainError::Parse {
            tool: "gdalinfo".to_string(),
            message: "no wgs84Extent field".to_string(),
        })
    }

    fn get_epsg(&self, raster: &Path) -> Result<Option<i64>, ToolchainError> {
        let info = self.info_json(raster)?;
        Ok(parse_epsg(&info))
    }

    fn transform_points(
        &self,
        points: &[[f64; 2]],
        source_epsg: i64,
        target_epsg: i64,
    ) -> Result<Vec<[f64; 2]>, ToolchainError> {
        let mut stdin = String::new();
        for p in points {
            stdin.push_str(&format!("{} {}\n", p[0], p[1]));
        }
        let output = ToolCommand::new("gdaltransform")
            .args(["-s_srs", &format!("EPSG:{}", source_epsg)])
            .args(["-t_srs", &format!("EPSG:{}", target_epsg)])
            .arg("-output_xy")
            .run_with_stdin(Some(&stdin))?;
        parse_point_lines(&output.stdout).ok_or_else(|| ToolchainError::Parse {
            tool: "gdaltransform".to_string(),
            message: "unparseable coordinate output".to_string(),
        })
    }
}

/// Writes the fully transparent 256×256 base tile at `z0/0/0` when the tile
/// builder omitted it.
fn ensure_base_tile(target_dir: &Path) -> Result<(), ToolchainError> {
    let tile = target_dir.join("0").join("0").join("0.png");
    if tile.exists() {
        return Ok(());
    }
    if let Some(parent) = tile.parent() {
        fs::create_dir_all(parent)?;
    }
    let empty = image::RgbaImage::new(256, 256);
    empty
        .save_with_format(&tile, image::ImageFormat::Png)
        .map_err(|e| ToolchainError::Parse {
            tool: "base-tile".to_string(),
            message: e.to_string(),
        })?;
    debug!(tile = %tile.display(), "synthesized empty base tile");
    Ok(())
}

fn detect_pixel_type(info: &serde_json::Value) -> Option<String> {
    info.get("bands")?
        .as_array()?
        .first()?
        .get("type")?
        .as_str()
        .map(str::to_string)
}

fn parse_size(info: &serde_json::Value) -> Option<(u32, u32)> {
    let size = info.get("size")?.as_array()?;
    Some((size.first()?.as_u64()? as u32, size.get(1)?.as_u64()? as u32))
}

fn parse_wgs84_extent(info: &serde_json::Value) -> Option<BBox> {
    BBox::from_geojson_polygon(info.get("wgs84Extent")?)
}

/// Extracts the EPSG code from the coordinate system WKT, accepting both
/// WKT2 `ID["EPSG",n]` and WKT1 `AUTHORITY["EPSG","n"]` spellings. The last
/// occurrence wins; it names the full CRS rather than a component.
fn parse_epsg(info: &serde_json::Value) -> Option<i64> {
    let wkt = info.pointer("/coordinateSystem/wkt")?.as_str()?;
    let mut code = None;
    for (marker, terminator) in [("ID[\"EPSG\",", "]"), ("AUTHORITY[\"EPSG\",\"", "\"")] {
        let mut rest = wkt;
        while let Some(at) = rest.find(marker) {
            rest = &rest[at + marker.len()..];
            if let Some(end) = rest.find(terminator) {
                if let Ok(parsed) = rest[..end].trim().parse() {
                    code = Some(parsed);
                }
            }
        }
    }
    code
}

fn parse_point_lines(stdout: &str) -> Option<Vec<[f64; 2]>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split_whitespace();
            let x = fields.next()?.parse().ok()?;
            let y = fields.next()?.parse().ok()?;
            Some([x, y])
        })
        .collect()
}
