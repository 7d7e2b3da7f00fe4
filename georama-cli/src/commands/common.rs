//! Shared setup for the pipeline commands.

use std::fs;

use georama::config::Settings;
use georama::jobs::Dispatcher;
use georama::search::EsIndex;
use georama::toolchain::GdalToolchain;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::CliError;

/// Opens the database and builds a dispatcher over the real toolchain and
/// index. The artifact roots are created up front so the first job does not
/// fail on a missing directory.
pub async fn build_dispatcher(
    settings: &Settings,
) -> Result<(Pool<Sqlite>, Dispatcher<GdalToolchain, EsIndex>), CliError> {
    ensure_roots(settings)?;

    let pool = georama::db::connect(&settings.database).await?;
    let index = EsIndex::new(&settings.index)?;
    index.ping().await?;

    let dispatcher = Dispatcher::new(
        pool.clone(),
        GdalToolchain::new(settings.gdal.clone()),
        index,
        settings,
    );
    info!(db_url = %settings.database.db_url, "pipeline initialized");
    Ok((pool, dispatcher))
}

fn ensure_roots(settings: &Settings) -> Result<(), CliError> {
    let paths = &settings.paths;
    for root in [
        &paths.image_root,
        &paths.georef_root,
        &paths.tms_root,
        &paths.mapfile_root,
        &paths.thumbnail_root,
        &paths.zoomify_root,
        &paths.mosaic_root,
        &paths.tmp_root,
    ] {
        fs::create_dir_all(root)?;
    }
    Ok(())
}
