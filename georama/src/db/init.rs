//! Schema initialization.

use sqlx::{Pool, Sqlite};
use tracing::info;

/// Creates all tables if they do not exist.
///
/// Foreign keys of map-owned rows cascade on delete, so removing a raw map
/// removes its metadata, transformations and georef product in one
/// statement (spec'd delete cascade).
pub async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raw_maps (
            id INTEGER PRIMARY KEY,
            file_name TEXT NOT NULL,
            rel_path TEXT NOT NULL,
            map_type TEXT NOT NULL,
            allow_download INTEGER NOT NULL DEFAULT 0,
            default_crs INTEGER,
            map_scale INTEGER,
            enabled INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metadata (
            raw_map_id INTEGER PRIMARY KEY
                REFERENCES raw_maps(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            title_short TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            license TEXT NOT NULL DEFAULT '',
            time_of_publication TEXT NOT NULL DEFAULT '',
            owner TEXT NOT NULL DEFAULT '',
            link_thumb_small TEXT,
            link_thumb_mid TEXT,
            link_zoomify TEXT,
            permalink TEXT,
            ppn TEXT,
            technique TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transformations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            raw_map_id INTEGER NOT NULL
                REFERENCES raw_maps(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            submitted TEXT NOT NULL,
            params TEXT NOT NULL,
            clip TEXT,
            target_crs INTEGER,
            validation TEXT NOT NULL DEFAULT 'MISSING',
            overwrites INTEGER NOT NULL DEFAULT 0,
            comment TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS georef_maps (
            raw_map_id INTEGER PRIMARY KEY
                REFERENCES raw_maps(id) ON DELETE CASCADE,
            transformation_id INTEGER NOT NULL
                REFERENCES transformations(id),
            extent TEXT,
            raster_path TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mosaic_maps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            raw_map_ids TEXT NOT NULL,
            title TEXT NOT NULL,
            title_short TEXT NOT NULL,
            time_of_publication TEXT NOT NULL,
            link_thumb TEXT,
            map_scale INTEGER,
            last_change TEXT NOT NULL,
            last_service_update TEXT,
            last_overview_update TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            submitted TEXT NOT NULL,
            user_id TEXT NOT NULL,
            job_type TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'NOT_STARTED',
            descriptor TEXT NOT NULL,
            error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("database schema ready");
    Ok(())
}
