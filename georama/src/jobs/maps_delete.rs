//! MAPS_DELETE processor: retract a sheet from all three stores.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use super::descriptor::MapsDeleteDescriptor;
use super::{Dispatcher, JobError, StaleStore};
use crate::db;
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

/// Deletes the map row (cascading metadata, transformations and the georef
/// row), then the index document, then every artifact on disk.
///
/// The database commits before any file is touched. A failure after that
/// point leaves the filesystem and/or index ahead of the database; the
/// error marks which side holds the stale state so an operator can run the
/// reconciler with the right expectation.
pub(super) async fn process<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &MapsDeleteDescriptor,
) -> Result<(), JobError> {
    let Some(raw_map) = db::raw_maps::by_id(&d.pool, descriptor.map_id).await? else {
        warn!(map_id = descriptor.map_id, "delete for unknown map, nothing to do");
        return Ok(());
    };
    let georef = db::georef_maps::by_map_id(&d.pool, raw_map.id).await?;

    // Capture every owned path before the rows disappear.
    let mut files: Vec<PathBuf> = vec![
        d.layout.raw_image_path(&raw_map.map_type, &raw_map.file_name),
        d.layout.thumbnail_path(raw_map.id, 400, 400),
        d.layout.thumbnail_path(raw_map.id, 120, 120),
        d.layout.mapfile_path(raw_map.id),
    ];
    if let Some(georef) = &georef {
        files.push(PathBuf::from(&georef.raster_path));
    }
    let dirs = vec![
        d.layout.zoomify_dir(raw_map.id),
        d.layout.tms_dir(&raw_map.map_type, &raw_map.file_name),
    ];

    if let Err(source) = delete_rows(d, raw_map.id).await {
        return Err(JobError::OutOfSync {
            map_id: raw_map.id,
            stale: StaleStore::Database,
            source: Box::new(source),
        });
    }

    let public_id = d.codec.encode_map_id(raw_map.id);
    if let Err(source) = retract(d, &public_id, &files, &dirs).await {
        return Err(JobError::OutOfSync {
            map_id: raw_map.id,
            stale: StaleStore::Filesystem,
            source: Box::new(source),
        });
    }
    info!(map_id = raw_map.id, "map deleted");
    Ok(())
}

async fn delete_rows<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    map_id: i64,
) -> Result<(), JobError> {
    let mut tx = d.pool.begin().await?;
    db::raw_maps::delete(&mut *tx, map_id).await?;
    tx.commit().await?;
    Ok(())
}

async fn retract<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    public_id: &str,
    files: &[PathBuf],
    dirs: &[PathBuf],
) -> Result<(), JobError> {
    d.index.delete(public_id).await?;
    for file in files {
        if file.exists() {
            fs::remove_file(file)?;
        }
    }
    for dir in dirs {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::descriptor;
    use crate::jobs::test_support::dispatcher_in;
    use crate::models::{GeorefMap, Metadata, RawMap, Transformation, ValidationState};
    use chrono::Utc;

    async fn seed(
        d: &Dispatcher<crate::toolchain::testing::MockToolchain, crate::search::testing::RecordingIndex>,
        dir: &std::path::Path,
    ) -> PathBuf {
        db::raw_maps::insert(
            &d.pool,
            &RawMap {
                id: 42,
                file_name: "42".to_string(),
                rel_path: "mtb/42.tif".to_string(),
                map_type: "mtb".to_string(),
                allow_download: false,
                default_crs: None,
                map_scale: None,
                enabled: true,
            },
        )
        .await
        .expect("seed map");
        db::metadata::insert(
            &d.pool,
            &Metadata {
                raw_map_id: 42,
                title: "T".to_string(),
                title_short: "T".to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("seed metadata");
        let transformation_id = db::transformations::insert(
            &d.pool,
            &Transformation {
                id: 0,
                raw_map_id: 42,
                user_id: "user".to_string(),
                submitted: Utc::now(),
                params: r#"{"source":"pixel","target":"EPSG:4314","algorithm":"tps","gcps":[]}"#
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

        let georef_raster = dir.join("georef/42.tif");
        fs::create_dir_all(georef_raster.parent().expect("parent")).expect("mkdir");
        fs::write(&georef_raster, b"georef").expect("write");
        db::georef_maps::upsert(
            &d.pool,
            &GeorefMap {
                raw_map_id: 42,
                transformation_id,
                extent: None,
                raster_path: georef_raster.display().to_string(),
            },
        )
        .await
        .expect("seed georef");

        // artifacts on disk
        let raw = dir.join("original/mtb/42.tif");
        fs::create_dir_all(raw.parent().expect("parent")).expect("mkdir");
        fs::write(&raw, b"raw").expect("write");
        fs::create_dir_all(dir.join("zoomify/42")).expect("mkdir");
        fs::create_dir_all(dir.join("tms/mtb/42")).expect("mkdir");
        fs::create_dir_all(dir.join("thumbnails")).expect("mkdir");
        fs::write(dir.join("thumbnails/42_120x120.jpg"), b"t").expect("write");

        georef_raster
    }

    #[tokio::test]
    async fn test_delete_clears_all_three_stores() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        let georef_raster = seed(&d, dir.path()).await;
        // simulate an existing index document
        let doc = crate::search::document::document_for_map(
            &db::raw_maps::by_id(&d.pool, 42).await.expect("q").expect("m"),
            &db::metadata::by_map_id(&d.pool, 42).await.expect("q").expect("m"),
            None,
            None,
            &d.codec,
            &d.settings.templates,
        );
        d.index.upsert(&doc.map_id, &doc).await.expect("seed index");

        let parsed = descriptor::parse(r#"{"map_id": 42}"#).expect("parse");
        process(&d, &parsed).await.expect("process");

        assert!(db::raw_maps::by_id(&d.pool, 42).await.expect("q").is_none());
        assert!(db::metadata::by_map_id(&d.pool, 42).await.expect("q").is_none());
        assert!(db::georef_maps::by_map_id(&d.pool, 42).await.expect("q").is_none());
        assert!(db::transformations::by_map_id(&d.pool, 42)
            .await
            .expect("q")
            .is_empty());

        assert!(d.index.is_empty());
        assert!(!georef_raster.exists());
        assert!(!dir.path().join("original/mtb/42.tif").exists());
        assert!(!dir.path().join("zoomify/42").exists());
        assert!(!dir.path().join("tms/mtb/42").exists());
        assert!(!dir.path().join("thumbnails/42_120x120.jpg").exists());
    }

    #[tokio::test]
    async fn test_unknown_map_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        let parsed = descriptor::parse(r#"{"map_id": 999}"#).expect("parse");
        process(&d, &parsed).await.expect("process");
    }

    #[tokio::test]
    async fn test_index_failure_after_commit_marks_filesystem_stale() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        seed(&d, dir.path()).await;
        d.index.fail_next();

        let parsed = descriptor::parse(r#"{"map_id": 42}"#).expect("parse");
        let err = process(&d, &parsed).await.expect_err("must fail");
        match err {
            JobError::OutOfSync { map_id, stale, .. } => {
                assert_eq!(map_id, 42);
                assert_eq!(stale, StaleStore::Filesystem);
            }
            other => panic!("unexpected error: {other}"),
        }
        // rows are gone, files remain: exactly the documented window
        assert!(db::raw_maps::by_id(&d.pool, 42).await.expect("q").is_none());
        assert!(dir.path().join("original/mtb/42.tif").exists());
    }
}
