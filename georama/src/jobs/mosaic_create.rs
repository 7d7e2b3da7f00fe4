//! MOSAIC_MAP_CREATE processor: compose and publish a mosaic.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use super::descriptor::MosaicDescriptor;
use super::{Dispatcher, JobError};
use crate::actions::{create_mosaic_services, update_mosaic_index};
use crate::config::TemplateSettings;
use crate::db;
use crate::mosaic;
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

/// CRS every mosaic member is brought into before stitching.
const MOSAIC_TARGET_EPSG: i64 = 3857;

/// Composes the mosaic dataset in scratch space, swaps it into place,
/// rebuilds the service file and the index document, then the overview
/// pyramid. Timestamps commit after each published stage so a crash leaves
/// an honest record of how far the build got.
pub(super) async fn process<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &MosaicDescriptor,
) -> Result<(), JobError> {
    let Some(mosaic_map) = db::mosaic_maps::by_id(&d.pool, descriptor.mosaic_map_id).await? else {
        return Err(JobError::MissingEntity {
            entity: "mosaic map",
            id: descriptor.mosaic_map_id,
        });
    };

    let inputs = collect_inputs(d, &mosaic_map.member_ids()).await?;

    fs::create_dir_all(d.layout.tmp_root())?;
    let scratch = tempfile::tempdir_in(d.layout.tmp_root())?;
    mosaic::build_dataset(
        &d.toolchain,
        &mosaic_map.name,
        scratch.path(),
        &inputs,
        MOSAIC_TARGET_EPSG,
    )?;

    // Swap the finished tree into place; the destination is stale or absent
    // for only the duration of the copy.
    let destination = d.layout.mosaic_dir(&mosaic_map.name);
    if destination.exists() {
        fs::remove_dir_all(&destination)?;
    }
    copy_tree(&scratch.path().join(&mosaic_map.name), &destination)?;

    let dataset = d.layout.mosaic_dataset_path(&mosaic_map.name);
    create_mosaic_services(
        &d.layout.mosaic_mapfile_path(&mosaic_map.name),
        &mosaic_map.name,
        &dataset,
        &TemplateSettings::fill(&d.settings.templates.wms_url_template, &mosaic_map.name),
        true,
    )?;

    update_mosaic_index(
        &d.toolchain,
        &d.index,
        &mosaic_map,
        &dataset,
        &d.codec,
        &d.settings.templates,
    )
    .await?;
    db::mosaic_maps::set_last_service_update(&d.pool, mosaic_map.id, Utc::now()).await?;

    mosaic::build_dataset_overviews(&d.toolchain, &dataset, mosaic::DEFAULT_OVERVIEW_LEVELS)?;
    db::mosaic_maps::set_last_overview_update(&d.pool, mosaic_map.id, Utc::now()).await?;

    info!(
        mosaic_id = mosaic_map.id,
        name = %mosaic_map.name,
        members = inputs.len(),
        "mosaic created"
    );
    Ok(())
}

/// Absolute georectified raster paths of every member that has one, in
/// composition order. Members without a georeference or with a missing
/// raster are skipped with a warning.
async fn collect_inputs<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    member_ids: &[i64],
) -> Result<Vec<PathBuf>, JobError> {
    let mut inputs = Vec::with_capacity(member_ids.len());
    for &map_id in member_ids {
        let Some(georef) = db::georef_maps::by_map_id(&d.pool, map_id).await? else {
            warn!(map_id, "mosaic member has no georeference, skipping");
            continue;
        };
        let path = PathBuf::from(&georef.raster_path);
        if !path.exists() {
            warn!(map_id, path = %path.display(), "mosaic member raster missing, skipping");
            continue;
        }
        inputs.push(path);
    }
    Ok(inputs)
}

fn copy_tree(source: &Path, destination: &Path) -> Result<(), std::io::Error> {
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
