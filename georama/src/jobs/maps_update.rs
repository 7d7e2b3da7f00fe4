//! MAPS_UPDATE processor: replace the source image and/or patch metadata.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::descriptor::MapsUpdateDescriptor;
use super::{Dispatcher, JobError};
use crate::actions::{create_raw, create_thumbnail, create_zoomify, update_index};
use crate::config::TemplateSettings;
use crate::db;
use crate::models::{GeorefMap, MetadataUpdate, RawMap};
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

/// Applies incoming changes and regenerates exactly the derived artifacts
/// whose URL this system owns.
///
/// A replaced source image resets the georeference state: the active
/// georef row, every transformation of the map and the rectified raster
/// are dropped, and the index document loses its service resources.
pub(super) async fn process<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &MapsUpdateDescriptor,
) -> Result<(), JobError> {
    let Some(raw_map) = db::raw_maps::by_id(&d.pool, descriptor.map_id).await? else {
        return Err(JobError::MissingEntity {
            entity: "raw map",
            id: descriptor.map_id,
        });
    };
    let Some(mut metadata) = db::metadata::by_map_id(&d.pool, raw_map.id).await? else {
        return Err(JobError::MissingEntity {
            entity: "metadata",
            id: raw_map.id,
        });
    };

    let updates = descriptor.metadata.clone().unwrap_or_default();
    let file_updated = descriptor.file.is_some();
    let raw_path = d.layout.raw_image_path(&raw_map.map_type, &raw_map.file_name);

    if let Some(file) = &descriptor.file {
        if create_raw(&d.toolchain, file, &raw_path, true)?.is_none() {
            return Err(JobError::MissingInput { path: file.clone() });
        }
    }

    // Rebuild decisions look at the state before the update is folded in.
    let templates = &d.settings.templates;
    let rebuild_zoomify = should_generate_files(
        metadata.link_zoomify.as_deref(),
        &updates,
        "link_zoomify",
        &templates.zoomify_url_template,
        file_updated,
    );
    let rebuild_mid = should_generate_files(
        metadata.link_thumb_mid.as_deref(),
        &updates,
        "link_thumb_mid",
        &templates.thumbnail_url_template,
        file_updated,
    );
    let rebuild_small = should_generate_files(
        metadata.link_thumb_small.as_deref(),
        &updates,
        "link_thumb_small",
        &templates.thumbnail_url_template,
        file_updated,
    );

    updates.apply_to(&mut metadata);

    if rebuild_zoomify {
        let dir = d.layout.zoomify_dir(raw_map.id);
        if create_zoomify(&d.toolchain, &raw_path, &dir, true)?.is_some() {
            metadata.link_zoomify = Some(TemplateSettings::fill(
                &templates.zoomify_url_template,
                &raw_map.id.to_string(),
            ));
        }
    }
    if rebuild_mid {
        metadata.link_thumb_mid = rebuild_thumbnail(d, raw_map.id, &raw_path, 400, 400)?;
    }
    if rebuild_small {
        metadata.link_thumb_small = rebuild_thumbnail(d, raw_map.id, &raw_path, 120, 120)?;
    }

    db::metadata::update(&d.pool, &metadata).await?;

    let mut georef = db::georef_maps::by_map_id(&d.pool, raw_map.id).await?;
    if file_updated {
        reset_georef_state(d, &raw_map, georef.take()).await?;
    }

    let clip = active_clip(d, georef.as_ref()).await?;
    update_index(
        &d.toolchain,
        &d.index,
        &raw_map,
        &metadata,
        georef.as_ref(),
        clip.as_deref(),
        &d.codec,
        templates,
    )
    .await?;
    info!(map_id = raw_map.id, file_updated, "map updated");
    Ok(())
}

/// Decides whether a derived link artifact must be regenerated.
///
/// - current value null: rebuild, something is missing;
/// - key named by the update: rebuild iff the incoming value is null or
///   internal (an external URL is taken as-is);
/// - otherwise: rebuild iff the source file changed and the current value
///   is internal.
pub(super) fn should_generate_files(
    current: Option<&str>,
    updates: &MetadataUpdate,
    key: &str,
    template: &str,
    file_updated: bool,
) -> bool {
    let Some(current) = current else {
        return true;
    };
    if updates.names_link(key) {
        match updates.link_value(key) {
            None => true,
            Some(new_value) => is_internal(new_value, template),
        }
    } else {
        file_updated && is_internal(current, template)
    }
}

/// A URL is internal when it starts with the configured template's fixed
/// prefix, i.e. this system would have produced it.
fn is_internal(url: &str, template: &str) -> bool {
    let prefix = template.split("{}").next().unwrap_or(template);
    !prefix.is_empty() && url.starts_with(prefix)
}

fn rebuild_thumbnail<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    map_id: i64,
    raw_path: &Path,
    width: u32,
    height: u32,
) -> Result<Option<String>, JobError> {
    let target = d.layout.thumbnail_path(map_id, width, height);
    if create_thumbnail(&d.toolchain, raw_path, &target, width, height, true)?.is_none() {
        return Ok(None);
    }
    Ok(Some(TemplateSettings::fill(
        &d.settings.templates.thumbnail_url_template,
        &format!("{}_{}x{}", map_id, width, height),
    )))
}

/// Drops the georef row, every transformation and the rectified raster of a
/// map whose source image was replaced.
async fn reset_georef_state<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    raw_map: &RawMap,
    georef: Option<GeorefMap>,
) -> Result<(), JobError> {
    let Some(georef) = georef else {
        return Ok(());
    };
    warn!(map_id = raw_map.id, "source image replaced, resetting georeference state");

    let raster = Path::new(&georef.raster_path);
    if raster.exists() {
        fs::remove_file(raster)?;
    }
    let mut tx = d.pool.begin().await?;
    db::georef_maps::delete(&mut *tx, raw_map.id).await?;
    db::transformations::delete_for_map(&mut *tx, raw_map.id).await?;
    tx.commit().await?;
    Ok(())
}

/// The stored clip of the map's active transformation, when one exists.
async fn active_clip<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    georef: Option<&GeorefMap>,
) -> Result<Option<String>, JobError> {
    let Some(georef) = georef else {
        return Ok(None);
    };
    let transformation = db::transformations::by_id(&d.pool, georef.transformation_id).await?;
    Ok(transformation.and_then(|t| t.clip))
}
