//! Startup consistency sweep.
//!
//! The database is the system of record; filesystem artifacts and the search
//! index are derived. After a restore, a migration or an index wipe this
//! sweep walks every persisted map and rebuilds whatever derived state is
//! missing, then republishes every index document. Rebuilds run without
//! force, so artifacts already on disk are left untouched.

use std::fs;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::actions::{create_geo, create_services, create_tms, update_index, update_mosaic_index};
use crate::config::TemplateSettings;
use crate::db;
use crate::jobs::{Dispatcher, JobError};
use crate::models::{GeorefMap, RawMap};
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

/// Sweeps single sheets first, then mosaics, newest id first within each.
///
/// A failure on one entity is logged and the sweep continues; only queue
/// and listing failures against the database abort it.
pub async fn initialize_data<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
) -> Result<(), sqlx::Error> {
    let maps = db::raw_maps::all_desc(&d.pool).await?;
    info!(count = maps.len(), "reconciling single sheets");
    for raw_map in &maps {
        if let Err(err) = reconcile_map(d, raw_map).await {
            error!(map_id = raw_map.id, error = %err, "sheet reconciliation failed");
        }
    }

    let mosaics = db::mosaic_maps::all_desc(&d.pool).await?;
    info!(count = mosaics.len(), "reconciling mosaics");
    for mosaic_map in &mosaics {
        let dataset = d.layout.mosaic_dataset_path(&mosaic_map.name);
        if let Err(err) = update_mosaic_index(
            &d.toolchain,
            &d.index,
            mosaic_map,
            &dataset,
            &d.codec,
            &d.settings.templates,
        )
        .await
        {
            error!(mosaic_id = mosaic_map.id, error = %err, "mosaic reconciliation failed");
        }
    }
    Ok(())
}

/// Rebuilds the georeference products of one sheet when it has an active
/// georeference and its source image on disk, then republishes its index
/// document either way.
async fn reconcile_map<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    raw_map: &RawMap,
) -> Result<(), JobError> {
    let Some(metadata) = db::metadata::by_map_id(&d.pool, raw_map.id).await? else {
        warn!(map_id = raw_map.id, "map has no metadata, skipping");
        return Ok(());
    };

    let mut georef = db::georef_maps::by_map_id(&d.pool, raw_map.id).await?;
    let mut clip = None;
    if let Some(active) = &mut georef {
        let raw_path = d.layout.raw_image_path(&raw_map.map_type, &raw_map.file_name);
        if raw_path.exists() {
            clip = rebuild_products(d, raw_map, active, &raw_path).await?;
        } else {
            warn!(
                map_id = raw_map.id,
                path = %raw_path.display(),
                "source image missing, georeference products not rebuilt"
            );
        }
    }

    update_index(
        &d.toolchain,
        &d.index,
        raw_map,
        &metadata,
        georef.as_ref(),
        clip.as_deref(),
        &d.codec,
        &d.settings.templates,
    )
    .await?;
    Ok(())
}

/// Regenerates raster, extent, tile pyramid and map service without force.
/// Returns the clip of the active transformation for the index document.
async fn rebuild_products<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    raw_map: &RawMap,
    georef: &mut GeorefMap,
    raw_path: &std::path::Path,
) -> Result<Option<String>, JobError> {
    let Some(transformation) =
        db::transformations::by_id(&d.pool, georef.transformation_id).await?
    else {
        return Err(JobError::MissingEntity {
            entity: "transformation",
            id: georef.transformation_id,
        });
    };

    let georef_path = PathBuf::from(&georef.raster_path);
    fs::create_dir_all(d.layout.tmp_root())?;
    let scratch = tempfile::tempdir_in(d.layout.tmp_root())?;
    if create_geo(
        &d.toolchain,
        raw_path,
        &georef_path,
        &transformation,
        scratch.path(),
        false,
    )?
    .is_none()
    {
        return Err(JobError::MissingInput {
            path: raw_path.to_path_buf(),
        });
    }

    let extent = d.toolchain.get_extent(&georef_path)?;
    let extent_json = extent.to_geojson_polygon().to_string();
    db::georef_maps::update_extent(&d.pool, raw_map.id, &extent_json).await?;
    georef.extent = Some(extent_json);

    create_tms(
        &d.toolchain,
        &georef_path,
        &d.layout.tms_dir(&raw_map.map_type, &raw_map.file_name),
        d.settings.gdal.tms_processes,
        raw_map.map_scale,
        scratch.path(),
        false,
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
        false,
    )?;
    Ok(transformation.clip.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::dispatcher_in;
    use crate::models::{Metadata, MosaicMap, Transformation, ValidationState};
    use chrono::Utc;
    use std::path::Path;

    type TestDispatcher = Dispatcher<
        crate::toolchain::testing::MockToolchain,
        crate::search::testing::RecordingIndex,
    >;

    async fn seed_map(d: &TestDispatcher, dir: &Path, map_id: i64, with_georef: bool) {
        db::raw_maps::insert(
            &d.pool,
            &RawMap {
                id: map_id,
                file_name: map_id.to_string(),
                rel_path: format!("mtb/{}.tif", map_id),
                map_type: "mtb".to_string(),
                allow_download: false,
                default_crs: Some(4314),
                map_scale: Some(25000),
                enabled: true,
            },
        )
        .await
        .expect("seed map");
        db::metadata::insert(
            &d.pool,
            &Metadata {
                raw_map_id: map_id,
                title: format!("Messtischblatt {}", map_id),
                title_short: format!("MTB {}", map_id),
                ..Default::default()
            },
        )
        .await
        .expect("seed metadata");

        let raw = dir.join(format!("original/mtb/{}.tif", map_id));
        fs::create_dir_all(raw.parent().expect("parent")).expect("mkdir");
        fs::write(&raw, b"raw").expect("write");

        if with_georef {
            let transformation_id = db::transformations::insert(
                &d.pool,
                &Transformation {
                    id: 0,
                    raw_map_id: map_id,
                    user_id: "user".to_string(),
                    submitted: Utc::now(),
                    params:
                        r#"{"source":"pixel","target":"EPSG:4314","algorithm":"tps","gcps":[]}"#
                            .to_string(),
                    clip: None,
                    target_crs: None,
                    validation: ValidationState::Valid,
                    overwrites: 0,
                    comment: None,
                },
            )
            .await
            .expect("seed transformation");
            db::georef_maps::upsert(
                &d.pool,
                &GeorefMap {
                    raw_map_id: map_id,
                    transformation_id,
                    extent: None,
                    raster_path: dir
                        .join(format!("georef/{}.tif", map_id))
                        .display()
                        .to_string(),
                },
            )
            .await
            .expect("seed georef");
        }
    }

    #[tokio::test]
    async fn test_sweep_rebuilds_missing_products_and_republishes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        seed_map(&d, dir.path(), 42, true).await;

        initialize_data(&d).await.expect("sweep");

        assert!(dir.path().join("georef/42.tif").exists());
        assert!(dir.path().join("tms/mtb/42").is_dir());
        assert!(dir.path().join("mapfiles/42.map").exists());
        let georef = db::georef_maps::by_map_id(&d.pool, 42)
            .await
            .expect("query")
            .expect("row");
        assert!(georef.extent.is_some());
        let doc = d
            .index
            .get("oai:de:slub-dresden:vk:id-42")
            .expect("document");
        assert!(doc.has_georeference);
    }

    #[tokio::test]
    async fn test_sweep_leaves_existing_raster_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        seed_map(&d, dir.path(), 42, true).await;
        let georef_path = dir.path().join("georef/42.tif");
        fs::create_dir_all(georef_path.parent().expect("parent")).expect("mkdir");
        fs::write(&georef_path, b"already rectified").expect("write");

        initialize_data(&d).await.expect("sweep");

        assert_eq!(fs::read(&georef_path).expect("read"), b"already rectified");
        assert_eq!(d.toolchain.call_count("rectify"), 0);
    }

    #[tokio::test]
    async fn test_ungeoreferenced_map_gets_document_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        seed_map(&d, dir.path(), 7, false).await;

        initialize_data(&d).await.expect("sweep");

        assert!(!dir.path().join("georef/7.tif").exists());
        assert!(!dir.path().join("mapfiles/7.map").exists());
        let doc = d.index.get("oai:de:slub-dresden:vk:id-7").expect("document");
        assert!(!doc.has_georeference);
    }

    #[tokio::test]
    async fn test_one_failing_sheet_does_not_abort_the_sweep() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        seed_map(&d, dir.path(), 1, false).await;
        seed_map(&d, dir.path(), 2, false).await;
        // id-descending sweep hits map 2 first; its publish fails
        d.index.fail_next();

        initialize_data(&d).await.expect("sweep");

        assert!(d.index.get("oai:de:slub-dresden:vk:id-2").is_none());
        assert!(d.index.get("oai:de:slub-dresden:vk:id-1").is_some());
    }

    #[tokio::test]
    async fn test_mosaics_swept_after_sheets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        let mosaic_id = db::mosaic_maps::insert(
            &d.pool,
            &MosaicMap {
                id: 0,
                name: "test_service".to_string(),
                raw_map_ids: "[1]".to_string(),
                title: "Test mosaic".to_string(),
                title_short: "Test".to_string(),
                time_of_publication: Utc::now(),
                link_thumb: None,
                map_scale: None,
                last_change: Utc::now(),
                last_service_update: None,
                last_overview_update: None,
            },
        )
        .await
        .expect("seed mosaic");
        let dataset = dir.path().join("mosaics/test_service/test_service.vrt");
        fs::create_dir_all(dataset.parent().expect("parent")).expect("mkdir");
        fs::write(&dataset, b"vrt").expect("write");

        initialize_data(&d).await.expect("sweep");

        let doc = d
            .index
            .get(&format!("oai:de:slub-dresden:vk:mosaic:id-{}", mosaic_id))
            .expect("document");
        assert_eq!(doc.doc_type, "mosaic");
        assert!(doc.geometry.is_some());
    }
}
