//! MOSAIC_MAP_DELETE processor: retract a mosaic.

use std::fs;

use tracing::{info, warn};

use super::descriptor::MosaicDescriptor;
use super::{Dispatcher, JobError};
use crate::db;
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

/// Deletes the mosaic row first, then the index document, the service file
/// and the dataset tree.
pub(super) async fn process<T: Toolchain, S: SearchIndex>(
    d: &Dispatcher<T, S>,
    descriptor: &MosaicDescriptor,
) -> Result<(), JobError> {
    let Some(mosaic_map) = db::mosaic_maps::by_id(&d.pool, descriptor.mosaic_map_id).await? else {
        warn!(
            mosaic_id = descriptor.mosaic_map_id,
            "delete for unknown mosaic, nothing to do"
        );
        return Ok(());
    };

    db::mosaic_maps::delete(&d.pool, mosaic_map.id).await?;

    d.index
        .delete(&d.codec.encode_mosaic_id(mosaic_map.id))
        .await?;

    let mapfile = d.layout.mosaic_mapfile_path(&mosaic_map.name);
    if mapfile.exists() {
        fs::remove_file(&mapfile)?;
    }
    let tree = d.layout.mosaic_dir(&mosaic_map.name);
    if tree.exists() {
        fs::remove_dir_all(&tree)?;
    }

    info!(mosaic_id = mosaic_map.id, name = %mosaic_map.name, "mosaic deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::descriptor;
    use crate::jobs::test_support::dispatcher_in;
    use crate::models::MosaicMap;
    use chrono::Utc;

    #[tokio::test]
    async fn test_delete_clears_row_document_and_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        let mosaic_id = db::mosaic_maps::insert(
            &d.pool,
            &MosaicMap {
                id: 0,
                name: "test_service".to_string(),
                raw_map_ids: "[1]".to_string(),
                title: "Test".to_string(),
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

        let images = dir.path().join("mosaics/test_service/images");
        fs::create_dir_all(&images).expect("mkdir");
        fs::write(images.join("1.tif"), b"raster").expect("write");
        let mapfile = dir.path().join("mapfiles/test_service.map");
        fs::create_dir_all(mapfile.parent().expect("parent")).expect("mkdir");
        fs::write(&mapfile, b"MAP END").expect("write");

        let parsed = descriptor::parse(&format!(r#"{{"mosaic_map_id": {}}}"#, mosaic_id))
            .expect("parse");
        process(&d, &parsed).await.expect("process");

        assert!(db::mosaic_maps::by_id(&d.pool, mosaic_id)
            .await
            .expect("query")
            .is_none());
        assert!(!mapfile.exists());
        assert!(!dir.path().join("mosaics/test_service").exists());
    }

    #[tokio::test]
    async fn test_unknown_mosaic_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher_in(dir.path()).await;
        let parsed = descriptor::parse(r#"{"mosaic_map_id": 999}"#).expect("parse");
        process(&d, &parsed).await.expect("process");
    }
}
