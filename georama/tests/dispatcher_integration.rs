//! End-to-end pipeline tests: jobs enqueued in the database, drained by the
//! dispatcher over a mock toolchain and an in-memory recording index.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use georama::config::Settings;
use georama::db;
use georama::jobs::Dispatcher;
use georama::models::{
    GeorefMap, JobState, JobType, MosaicMap, RawMap, Transformation, ValidationState,
};
use georama::search::testing::RecordingIndex;
use georama::toolchain::testing::MockToolchain;

type TestDispatcher = Dispatcher<MockToolchain, Arc<RecordingIndex>>;

/// Dispatcher over an in-memory database with every artifact root under
/// `dir`. The returned index handle shares state with the dispatcher's.
async fn pipeline(
    dir: &Path,
    toolchain: MockToolchain,
) -> (Pool<Sqlite>, Arc<RecordingIndex>, TestDispatcher) {
    let mut settings = Settings::default();
    settings.paths.image_root = dir.join("original");
    settings.paths.georef_root = dir.join("georef");
    settings.paths.tms_root = dir.join("tms");
    settings.paths.mapfile_root = dir.join("mapfiles");
    settings.paths.thumbnail_root = dir.join("thumbnails");
    settings.paths.zoomify_root = dir.join("zoomify");
    settings.paths.mosaic_root = dir.join("mosaics");
    settings.paths.tmp_root = dir.join("tmp");

    let pool = db::connect_in_memory().await.expect("pool");
    let index = Arc::new(RecordingIndex::new());
    let dispatcher = Dispatcher::new(pool.clone(), toolchain, Arc::clone(&index), &settings);
    (pool, index, dispatcher)
}

fn create_descriptor(source: &Path) -> String {
    serde_json::json!({
        "map_id": 42,
        "file": source,
        "metadata": {
            "map_type": "mtb",
            "map_scale": 1,
            "title": "Test",
            "title_short": "Test",
            "description": "Test",
            "license": "CC-0",
            "time_of_publication": "1923-01-01",
            "owner": "Test Owner"
        }
    })
    .to_string()
}

async fn enqueue_and_run(
    pool: &Pool<Sqlite>,
    dispatcher: &TestDispatcher,
    job_type: JobType,
    descriptor: &str,
) -> JobState {
    let job_id = db::jobs::insert(pool, "test", job_type, descriptor)
        .await
        .expect("enqueue");
    assert!(dispatcher.run_once().await.expect("poll"));
    db::jobs::by_id(pool, job_id)
        .await
        .expect("query")
        .expect("job")
        .state
}

#[tokio::test]
async fn test_create_map_happy_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (pool, index, dispatcher) = pipeline(dir.path(), MockToolchain::new()).await;

    let source = dir.path().join("upload/dd_stad_0000007_0015.tif");
    fs::create_dir_all(source.parent().expect("parent")).expect("mkdir");
    fs::write(&source, b"scan").expect("write");

    let state = enqueue_and_run(
        &pool,
        &dispatcher,
        JobType::MapsCreate,
        &create_descriptor(&source),
    )
    .await;
    assert_eq!(state, JobState::Completed);

    assert!(dir.path().join("original/mtb/42.tif").exists());
    assert!(dir.path().join("thumbnails/42_120x120.jpg").exists());
    assert!(dir.path().join("thumbnails/42_400x400.jpg").exists());
    assert!(dir.path().join("zoomify/42").is_dir());

    let raw_map = db::raw_maps::by_id(&pool, 42)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(raw_map.map_type, "mtb");
    assert_eq!(raw_map.rel_path, "mtb/42.tif");

    let doc = index.get("oai:de:slub-dresden:vk:id-42").expect("document");
    assert_eq!(doc.title, "Test");
    assert!(!doc.has_georeference);
}

#[tokio::test]
async fn test_create_with_missing_upload_fails_without_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (pool, index, dispatcher) = pipeline(dir.path(), MockToolchain::new()).await;

    let state = enqueue_and_run(
        &pool,
        &dispatcher,
        JobType::MapsCreate,
        &create_descriptor(&dir.path().join("upload/nowhere.tif")),
    )
    .await;
    assert_eq!(state, JobState::Failed);

    assert!(db::raw_maps::by_id(&pool, 42).await.expect("query").is_none());
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_tile_pyramid_rebuild_is_idempotent() {
    use georama::actions::create_tms;

    let dir = tempfile::tempdir().expect("tempdir");
    let toolchain = MockToolchain::new();
    let source = dir.path().join("georef/42.tif");
    fs::create_dir_all(source.parent().expect("parent")).expect("mkdir");
    fs::write(&source, b"georef").expect("write");
    let target = dir.path().join("tms/mtb/42");
    let tmp = dir.path().join("tmp");
    fs::create_dir_all(&tmp).expect("mkdir");

    create_tms(&toolchain, &source, &target, 2, None, &tmp, false).expect("first build");
    let first = fs::metadata(&target).expect("meta").modified().expect("mtime");

    std::thread::sleep(Duration::from_millis(20));
    create_tms(&toolchain, &source, &target, 2, None, &tmp, false).expect("second build");
    let second = fs::metadata(&target).expect("meta").modified().expect("mtime");
    assert_eq!(first, second);

    std::thread::sleep(Duration::from_millis(20));
    create_tms(&toolchain, &source, &target, 2, None, &tmp, true).expect("forced build");
    let third = fs::metadata(&target).expect("meta").modified().expect("mtime");
    assert!(third > second);
}

#[tokio::test]
async fn test_delete_cascades_across_all_stores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (pool, index, dispatcher) = pipeline(dir.path(), MockToolchain::new()).await;

    let source = dir.path().join("upload/dd_stad_0000007_0015.tif");
    fs::create_dir_all(source.parent().expect("parent")).expect("mkdir");
    fs::write(&source, b"scan").expect("write");
    let state = enqueue_and_run(
        &pool,
        &dispatcher,
        JobType::MapsCreate,
        &create_descriptor(&source),
    )
    .await;
    assert_eq!(state, JobState::Completed);

    let state = enqueue_and_run(&pool, &dispatcher, JobType::MapsDelete, r#"{"map_id": 42}"#).await;
    assert_eq!(state, JobState::Completed);

    assert!(db::raw_maps::by_id(&pool, 42).await.expect("query").is_none());
    assert!(db::metadata::by_map_id(&pool, 42)
        .await
        .expect("query")
        .is_none());
    assert!(!dir.path().join("original/mtb/42.tif").exists());
    assert!(!dir.path().join("thumbnails/42_120x120.jpg").exists());
    assert!(!dir.path().join("thumbnails/42_400x400.jpg").exists());
    assert!(!dir.path().join("zoomify/42").exists());
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_mosaic_create_publishes_dataset_and_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toolchain = MockToolchain::new();

    // three members in mixed CRSes
    let mut rasters = Vec::new();
    for (map_id, epsg) in [(1_i64, 3857_i64), (2, 4314), (3, 4326)] {
        let raster = dir.path().join(format!("georef/{}.tif", map_id));
        fs::create_dir_all(raster.parent().expect("parent")).expect("mkdir");
        fs::write(&raster, b"georef").expect("write");
        toolchain.set_epsg(&raster, epsg);
        rasters.push((map_id, raster));
    }

    let (pool, index, dispatcher) = pipeline(dir.path(), toolchain).await;
    for (map_id, raster) in &rasters {
        db::raw_maps::insert(
            &pool,
            &RawMap {
                id: *map_id,
                file_name: map_id.to_string(),
                rel_path: format!("mtb/{}.tif", map_id),
                map_type: "mtb".to_string(),
                allow_download: false,
                default_crs: None,
                map_scale: None,
                enabled: true,
            },
        )
        .await
        .expect("seed map");
        let transformation_id = db::transformations::insert(
            &pool,
            &Transformation {
                id: 0,
                raw_map_id: *map_id,
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
        db::georef_maps::upsert(
            &pool,
            &GeorefMap {
                raw_map_id: *map_id,
                transformation_id,
                extent: None,
                raster_path: raster.display().to_string(),
            },
        )
        .await
        .expect("seed georef");
    }
    let mosaic_id = db::mosaic_maps::insert(
        &pool,
        &MosaicMap {
            id: 0,
            name: "test_service".to_string(),
            raw_map_ids: "[1, 2, 3]".to_string(),
            title: "Test mosaic".to_string(),
            title_short: "Test".to_string(),
            time_of_publication: Utc::now(),
            link_thumb: None,
            map_scale: Some(25000),
            last_change: Utc::now(),
            last_service_update: None,
            last_overview_update: None,
        },
    )
    .await
    .expect("seed mosaic");

    let state = enqueue_and_run(
        &pool,
        &dispatcher,
        JobType::MosaicMapCreate,
        &format!(r#"{{"mosaic_map_id": {}}}"#, mosaic_id),
    )
    .await;
    assert_eq!(state, JobState::Completed);

    assert!(dir
        .path()
        .join("mosaics/test_service/test_service.vrt")
        .exists());
    assert!(dir.path().join("mapfiles/test_service.map").exists());

    let mosaic_map = db::mosaic_maps::by_id(&pool, mosaic_id)
        .await
        .expect("query")
        .expect("row");
    assert!(mosaic_map.last_service_update.is_some());

    let doc = index
        .get(&format!("oai:de:slub-dresden:vk:mosaic:id-{}", mosaic_id))
        .expect("document");
    assert_eq!(doc.doc_type, "mosaic");
    assert!(doc.geometry.is_some());
}
