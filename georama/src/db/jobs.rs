//! Job queue repository.

use chrono::Utc;
use sqlx::SqliteExecutor;

use crate::models::{Job, JobState, JobType};

/// The oldest job still waiting to be picked up.
///
/// Jobs are dispatched in submission order; ties break on id.
pub async fn oldest_not_started<'e, E>(executor: E) -> Result<Option<Job>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Job>(
        "SELECT * FROM jobs WHERE state = 'NOT_STARTED' ORDER BY submitted, id LIMIT 1",
    )
    .fetch_optional(executor)
    .await
}

pub async fn by_id<'e, E>(executor: E, id: i64) -> Result<Option<Job>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Enqueues a job and returns its id.
pub async fn insert<'e, E>(
    executor: E,
    user_id: &str,
    job_type: JobType,
    descriptor: &str,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO jobs (submitted, user_id, job_type, state, descriptor)
        VALUES (?, ?, ?, 'NOT_STARTED', ?)
        "#,
    )
    .bind(Utc::now())
    .bind(user_id)
    .bind(job_type)
    .bind(descriptor)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn set_state<'e, E>(executor: E, id: i64, state: JobState) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE jobs SET state = ? WHERE id = ?")
        .bind(state)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Marks a job failed, recording the error class and message.
pub async fn set_failed<'e, E>(executor: E, id: i64, error: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE jobs SET state = 'FAILED', error = ? WHERE id = ?")
        .bind(error)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
