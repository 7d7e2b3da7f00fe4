//! Transformation repository.

use sqlx::SqliteExecutor;

use crate::models::Transformation;

pub async fn by_id<'e, E>(executor: E, id: i64) -> Result<Option<Transformation>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Transformation>("SELECT * FROM transformations WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn by_map_id<'e, E>(
    executor: E,
    raw_map_id: i64,
) -> Result<Vec<Transformation>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Transformation>(
        "SELECT * FROM transformations WHERE raw_map_id = ? ORDER BY submitted",
    )
    .bind(raw_map_id)
    .fetch_all(executor)
    .await
}

/// Inserts a transformation and returns its generated id.
pub async fn insert<'e, E>(
    executor: E,
    transformation: &Transformation,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO transformations
            (raw_map_id, user_id, submitted, params, clip, target_crs,
             validation, overwrites, comment)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(transformation.raw_map_id)
    .bind(&transformation.user_id)
    .bind(transformation.submitted)
    .bind(&transformation.params)
    .bind(&transformation.clip)
    .bind(transformation.target_crs)
    .bind(transformation.validation)
    .bind(transformation.overwrites)
    .bind(&transformation.comment)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Removes every transformation of a raw map (georef-state reset on file
/// replacement).
pub async fn delete_for_map<'e, E>(executor: E, raw_map_id: i64) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM transformations WHERE raw_map_id = ?")
        .bind(raw_map_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
