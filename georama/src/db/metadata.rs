//! Metadata repository.

use sqlx::SqliteExecutor;

use crate::models::Metadata;

pub async fn by_map_id<'e, E>(executor: E, raw_map_id: i64) -> Result<Option<Metadata>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Metadata>("SELECT * FROM metadata WHERE raw_map_id = ?")
        .bind(raw_map_id)
        .fetch_optional(executor)
        .await
}

pub async fn insert<'e, E>(executor: E, metadata: &Metadata) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO metadata
            (raw_map_id, title, title_short, description, license, time_of_publication,
             owner, link_thumb_small, link_thumb_mid, link_zoomify, permalink, ppn, technique)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(metadata.raw_map_id)
    .bind(&metadata.title)
    .bind(&metadata.title_short)
    .bind(&metadata.description)
    .bind(&metadata.license)
    .bind(&metadata.time_of_publication)
    .bind(&metadata.owner)
    .bind(&metadata.link_thumb_small)
    .bind(&metadata.link_thumb_mid)
    .bind(&metadata.link_zoomify)
    .bind(&metadata.permalink)
    .bind(&metadata.ppn)
    .bind(&metadata.technique)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update<'e, E>(executor: E, metadata: &Metadata) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE metadata
        SET title = ?, title_short = ?, description = ?, license = ?,
            time_of_publication = ?, owner = ?, link_thumb_small = ?,
            link_thumb_mid = ?, link_zoomify = ?, permalink = ?, ppn = ?, technique = ?
        WHERE raw_map_id = ?
        "#,
    )
    .bind(&metadata.title)
    .bind(&metadata.title_short)
    .bind(&metadata.description)
    .bind(&metadata.license)
    .bind(&metadata.time_of_publication)
    .bind(&metadata.owner)
    .bind(&metadata.link_thumb_small)
    .bind(&metadata.link_thumb_mid)
    .bind(&metadata.link_zoomify)
    .bind(&metadata.permalink)
    .bind(&metadata.ppn)
    .bind(&metadata.technique)
    .bind(metadata.raw_map_id)
    .execute(executor)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawMap;

    async fn seed_map(pool: &sqlx::Pool<sqlx::Sqlite>, id: i64) {
        crate::db::raw_maps::insert(
            pool,
            &RawMap {
                id,
                file_name: id.to_string(),
                rel_path: format!("mtb/{}.tif", id),
                map_type: "mtb".to_string(),
                allow_download: false,
                default_crs: None,
                map_scale: None,
                enabled: true,
            },
        )
        .await
        .expect("seed raw map");
    }

    #[tokio::test]
    async fn test_insert_update_fetch() {
        let pool = crate::db::connect_in_memory().await.expect("pool");
        seed_map(&pool, 42).await;

        let mut metadata = Metadata {
            raw_map_id: 42,
            title: "Test".to_string(),
            title_short: "Test".to_string(),
            license: "CC-0".to_string(),
            ..Default::default()
        };
        insert(&pool, &metadata).await.expect("insert");

        metadata.link_zoomify = Some("http://localhost/zoomify/42".to_string());
        update(&pool, &metadata).await.expect("update");

        let row = by_map_id(&pool, 42).await.expect("query").expect("row");
        assert_eq!(row.license, "CC-0");
        assert_eq!(
            row.link_zoomify.as_deref(),
            Some("http://localhost/zoomify/42")
        );
    }

    #[tokio::test]
    async fn test_cascade_on_map_delete() {
        let pool = crate::db::connect_in_memory().await.expect("pool");
        seed_map(&pool, 42).await;
        insert(
            &pool,
            &Metadata {
                raw_map_id: 42,
                title: "Test".to_string(),
                title_short: "Test".to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("insert");

        crate::db::raw_maps::delete(&pool, 42).await.expect("delete");
        assert!(by_map_id(&pool, 42).await.expect("query").is_none());
    }
}
