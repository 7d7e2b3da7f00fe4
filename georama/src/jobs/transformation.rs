//! TRANSFORMATION_SET / TRANSFORMATION_PROCESS processor.
//!
//! Enabling a transformation produces the full georeference product set of
//! its map (rectified raster, extent, tile pyramid, map service) and points
//! the georef row at it. Disabling retires all of it and republishes the
//! map as an ungeoreferenced sheet.

use std::fs;
use std::path::Path;

use tracing::info;

use super::descriptor::TransformationDescriptor;
use super::{Dispatcher, JobError};
use crate::actions::{create_geo, create_services, create_tms, update_index};
use crate::config::TemplateSettings;
use crate::db;
use crate::models::{GeorefMap, Metadata, RawMap, Transformation};
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

pub(super) async fn process<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &TransformationDescriptor,
) -> Result<(), JobError> {
    let Some(transformation) =
        db::transformations::by_id(&d.pool, descriptor.transformation_id).await?
    else {
        return Err(JobError::MissingEntity {
            entity: "transformation",
            id: descriptor.transformation_id,
        });
    };
    let Some(raw_map) = db::raw_maps::by_id(&d.pool, transformation.raw_map_id).await? else {
        return Err(JobError::MissingEntity {
            entity: "raw map",
            id: transformation.raw_map_id,
        });
    };
    let Some(metadata) = db::metadata::by_map_id(&d.pool, raw_map.id).await? else {
        return Err(JobError::MissingEntity {
            entity: "metadata",
            id: raw_map.id,
        });
    };

    if descriptor.enabled {
        enable(d, &transformation, &raw_map, &metadata).await
    } else {
        disable(d, &raw_map, &metadata).await
    }
}

async fn enable<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    transformation: &Transformation,
    raw_map: &RawMap,
    metadata: &Metadata,
) -> Result<(), JobError> {
    let raw_path = d.layout.raw_image_path(&raw_map.map_type, &raw_map.file_name);
    let georef_path = d.layout.georef_path(&raw_map.file_name);

    fs::create_dir_all(d.layout.tmp_root())?;
    let scratch = tempfile::tempdir_in(d.layout.tmp_root())?;

    if create_geo(
        &d.toolchain,
        &raw_path,
        &georef_path,
        transformation,
        scratch.path(),
        true,
    )?
    .is_none()
    {
        return Err(JobError::MissingInput { path: raw_path });
    }

    let extent = d.toolchain.get_extent(&georef_path)?;

    create_tms(
        &d.toolchain,
        &georef_path,
        &d.layout.tms_dir(&raw_map.map_type, &raw_map.file_name),
        d.settings.gdal.tms_processes,
        raw_map.map_scale,
        scratch.path(),
        true,
    )?;
    create_services(
        &d.layout.mapfile_path(raw_map.id),
        &raw_map.id.to_string(),
        &georef_path,
        &TemplateSettings::fill(
            &d.settings.templates.wms_url_template,
            &raw_map.id.to_string(),
        ),
        true,
        true,
    )?;

    let georef = GeorefMap {
        raw_map_id: raw_map.id,
        transformation_id: transformation.id,
        extent: Some(extent.to_geojson_polygon().to_string()),
        raster_path: georef_path.display().to_string(),
    };
    db::georef_maps::upsert(&d.pool, &georef).await?;

    update_index(
        &d.toolchain,
        &d.index,
        raw_map,
        metadata,
        Some(&georef),
        transformation.clip.as_deref(),
        &d.codec,
        &d.settings.templates,
    )
    .await?;
    info!(
        map_id = raw_map.id,
        transformation_id = transformation.id,
        "transformation enabled"
    );
    Ok(())
}

async fn disable<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    raw_map: &RawMap,
    metadata: &Metadata,
) -> Result<(), JobError> {
    if let Some(georef) = db::georef_maps::by_map_id(&d.pool, raw_map.id).await? {
        let raster = Path::new(&georef.raster_path);
        if raster.exists() {
            fs::remove_file(raster)?;
        }
        db::georef_maps::delete(&d.pool, raw_map.id).await?;
    }

    let tms_dir = d.layout.tms_dir(&raw_map.map_type, &raw_map.file_name);
    if tms_dir.exists() {
        fs::remove_dir_all(&tms_dir)?;
    }
    let mapfile = d.layout.mapfile_path(raw_map.id);
    if mapfile.exists() {
        fs::remove_file(&mapfile)?;
    }

    update_index(
        &d.toolchain,
        &d.index,
        raw_map,
        metadata,
        None,
        None,
        &d.codec,
        &d.settings.templates,
    )
    .await?;
    info!(map_id = raw_map.id, "transformation disabled");
    Ok(())
}
