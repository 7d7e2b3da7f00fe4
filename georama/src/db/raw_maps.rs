//! Raw map repository.

use sqlx::SqliteExecutor;

use crate::models::RawMap;

pub async fn by_id<'e, E>(executor: E, id: i64) -> Result<Option<RawMap>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, RawMap>("SELECT * FROM raw_maps WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// All raw maps, id descending (reconciler sweep order).
pub async fn all_desc<'e, E>(executor: E) -> Result<Vec<RawMap>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, RawMap>("SELECT * FROM raw_maps ORDER BY id DESC")
        .fetch_all(executor)
        .await
}

pub async fn insert<'e, E>(executor: E, map: &RawMap) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO raw_maps
            (id, file_name, rel_path, map_type, allow_download, default_crs, map_scale, enabled)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(map.id)
    .bind(&map.file_name)
    .bind(&map.rel_path)
    .bind(&map.map_type)
    .bind(map.allow_download)
    .bind(map.default_crs)
    .bind(map.map_scale)
    .bind(map.enabled)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update<'e, E>(executor: E, map: &RawMap) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE raw_maps
        SET file_name = ?, rel_path = ?, map_type = ?, allow_download = ?,
            default_crs = ?, map_scale = ?, enabled = ?
        WHERE id = ?
        "#,
    )
    .bind(&map.file_name)
    .bind(&map.rel_path)
    .bind(&map.map_type)
    .bind(map.allow_download)
    .bind(map.default_crs)
    .bind(map.map_scale)
    .bind(map.enabled)
    .bind(map.id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Deletes the raw map row; metadata, transformations and the georef map
/// cascade with it.
pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM raw_maps WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i64) -> RawMap {
        RawMap {
            id,
            file_name: id.to_string(),
            rel_path: format!("mtb/{}.tif", id),
            map_type: "mtb".to_string(),
            allow_download: true,
            default_crs: Some(4314),
            map_scale: Some(25000),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let pool = crate::db::connect_in_memory().await.expect("pool");
        insert(&pool, &sample(42)).await.expect("insert");

        let map = by_id(&pool, 42).await.expect("query").expect("row");
        assert_eq!(map.file_name, "42");
        assert!(map.allow_download);
        assert_eq!(map.map_scale, Some(25000));

        assert!(by_id(&pool, 99).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn test_update() {
        let pool = crate::db::connect_in_memory().await.expect("pool");
        insert(&pool, &sample(42)).await.expect("insert");

        let mut map = sample(42);
        map.map_scale = None;
        map.allow_download = false;
        update(&pool, &map).await.expect("update");

        let map = by_id(&pool, 42).await.expect("query").expect("row");
        assert_eq!(map.map_scale, None);
        assert!(!map.allow_download);
    }

    #[tokio::test]
    async fn test_all_desc_order() {
        let pool = crate::db::connect_in_memory().await.expect("pool");
        for id in [3, 1, 2] {
            insert(&pool, &sample(id)).await.expect("insert");
        }
        let ids: Vec<i64> = all_desc(&pool)
            .await
            .expect("query")
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
