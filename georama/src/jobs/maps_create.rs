//! MAPS_CREATE processor: import a new sheet.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use super::descriptor::MapsCreateDescriptor;
use super::{Dispatcher, JobError};
use crate::actions::{create_raw, create_thumbnail, create_zoomify, update_index};
use crate::config::TemplateSettings;
use crate::db;
use crate::models::Metadata;
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

const THUMB_MID: (u32, u32) = (400, 400);
const THUMB_SMALL: (u32, u32) = (120, 120);

/// Lands the preprocessed raster, fills in missing presentation artifacts
/// (image pyramid, thumbnails), persists both entity rows and publishes the
/// search document.
///
/// On any failure every artifact created by this run is deleted again; the
/// row inserts happen inside one transaction that only commits after the
/// index upsert succeeded.
pub(super) async fn process<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &MapsCreateDescriptor,
) -> Result<(), JobError> {
    let raw_map = descriptor.metadata.raw_map(descriptor.map_id);
    let mut metadata = descriptor.metadata.metadata(descriptor.map_id);
    let mut created: Vec<PathBuf> = Vec::new();

    match build(d, descriptor, &mut metadata, &mut created).await {
        Ok(()) => {
            info!(map_id = raw_map.id, "map created");
            Ok(())
        }
        Err(err) => {
            rollback_artifacts(&created);
            Err(err)
        }
    }
}

async fn build<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &MapsCreateDescriptor,
    metadata: &mut Metadata,
    created: &mut Vec<PathBuf>,
) -> Result<(), JobError> {
    let raw_map = descriptor.metadata.raw_map(descriptor.map_id);
    let raw_path = d.layout.raw_image_path(&raw_map.map_type, &raw_map.file_name);

    if create_raw(&d.toolchain, &descriptor.file, &raw_path, false)?.is_none() {
        return Err(JobError::MissingInput {
            path: descriptor.file.clone(),
        });
    }
    created.push(raw_path.clone());

    if metadata.link_zoomify.is_none() {
        let dir = d.layout.zoomify_dir(raw_map.id);
        if create_zoomify(&d.toolchain, &raw_path, &dir, false)?.is_some() {
            created.push(dir);
            metadata.link_zoomify = Some(TemplateSettings::fill(
                &d.settings.templates.zoomify_url_template,
                &raw_map.id.to_string(),
            ));
        }
    }
    if metadata.link_thumb_mid.is_none() {
        metadata.link_thumb_mid = build_thumbnail(d, raw_map.id, &raw_path, THUMB_MID, created)?;
    }
    if metadata.link_thumb_small.is_none() {
        metadata.link_thumb_small =
            build_thumbnail(d, raw_map.id, &raw_path, THUMB_SMALL, created)?;
    }

    let mut tx = d.pool.begin().await?;
    db::raw_maps::insert(&mut *tx, &raw_map).await?;
    db::metadata::insert(&mut *tx, metadata).await?;
    update_index(
        &d.toolchain,
        &d.index,
        &raw_map,
        metadata,
        None,
        None,
        &d.codec,
        &d.settings.templates,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

fn build_thumbnail<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    map_id: i64,
    raw_path: &std::path::Path,
    (width, height): (u32, u32),
    created: &mut Vec<PathBuf>,
) -> Result<Option<String>, JobError> {
    let target = d.layout.thumbnail_path(map_id, width, height);
    if create_thumbnail(&d.toolchain, raw_path, &target, width, height, false)?.is_none() {
        return Ok(None);
    }
    created.push(target);
    Ok(Some(TemplateSettings::fill(
        &d.settings.templates.thumbnail_url_template,
        &format!("{}_{}x{}", map_id, width, height),
    )))
}

/// Removes every artifact this run created, best-effort.
fn rollback_artifacts(created: &[PathBuf]) {
    for path in created {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "rollback could not remove artifact");
        }
    }
}
