//! Georef map repository.

use sqlx::SqliteExecutor;

use crate::models::GeorefMap;

pub async fn by_map_id<'e, E>(
    executor: E,
    raw_map_id: i64,
) -> Result<Option<GeorefMap>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, GeorefMap>("SELECT * FROM georef_maps WHERE raw_map_id = ?")
        .bind(raw_map_id)
        .fetch_optional(executor)
        .await
}

/// Inserts or replaces the georef product row for a raw map.
///
/// Enabling a transformation for a map that already has one replaces the
/// active reference in place.
pub async fn upsert<'e, E>(executor: E, georef: &GeorefMap) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO georef_maps (raw_map_id, transformation_id, extent, raster_path)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(raw_map_id) DO UPDATE
        SET transformation_id = excluded.transformation_id,
            extent = excluded.extent,
            raster_path = excluded.raster_path
        "#,
    )
    .bind(georef.raw_map_id)
    .bind(georef.transformation_id)
    .bind(&georef.extent)
    .bind(&georef.raster_path)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update_extent<'e, E>(
    executor: E,
    raw_map_id: i64,
    extent: &str,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE georef_maps SET extent = ? WHERE raw_map_id = ?")
        .bind(extent)
        .bind(raw_map_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, raw_map_id: i64) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM georef_maps WHERE raw_map_id = ?")
        .bind(raw_map_id)
        .execute(executor)
        .await?;
    Ok(())
}
