//! Mosaic map repository.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use crate::models::MosaicMap;

pub async fn by_id<'e, E>(executor: E, id: i64) -> Result<Option<MosaicMap>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, MosaicMap>("SELECT * FROM mosaic_maps WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// All mosaics, id descending (reconciler sweep order).
pub async fn all_desc<'e, E>(executor: E) -> Result<Vec<MosaicMap>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, MosaicMap>("SELECT * FROM mosaic_maps ORDER BY id DESC")
        .fetch_all(executor)
        .await
}

/// Inserts a mosaic and returns its generated id.
pub async fn insert<'e, E>(executor: E, mosaic: &MosaicMap) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO mosaic_maps
            (name, raw_map_ids, title, title_short, time_of_publication,
             link_thumb, map_scale, last_change, last_service_update, last_overview_update)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&mosaic.name)
    .bind(&mosaic.raw_map_ids)
    .bind(&mosaic.title)
    .bind(&mosaic.title_short)
    .bind(mosaic.time_of_publication)
    .bind(&mosaic.link_thumb)
    .bind(mosaic.map_scale)
    .bind(mosaic.last_change)
    .bind(mosaic.last_service_update)
    .bind(mosaic.last_overview_update)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn set_last_service_update<'e, E>(
    executor: E,
    id: i64,
    stamp: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE mosaic_maps SET last_service_update = ? WHERE id = ?")
        .bind(stamp)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_last_overview_update<'e, E>(
    executor: E,
    id: i64,
    stamp: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE mosaic_maps SET last_overview_update = ? WHERE id = ?")
        .bind(stamp)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM mosaic_maps WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
