//! Database layer: connection, schema and repositories.
//!
//! The relational database is the system of record for all entity state.
//! Repository functions are generic over [`sqlx::SqliteExecutor`] so a
//! processor can run them against the pool or inside a transaction,
//! matching the commit points each job defines.

pub mod georef_maps;
pub mod init;
pub mod jobs;
pub mod metadata;
pub mod mosaic_maps;
pub mod raw_maps;
pub mod transformations;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

use crate::config::DatabaseSettings;

/// Opens the database pool and ensures the schema exists.
pub async fn connect(settings: &DatabaseSettings) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.db_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    init::create_schema(&pool).await?;
    Ok(pool)
}

/// Opens an in-memory database with the schema applied. Test fixture.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    // A single connection keeps the in-memory database alive and shared.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    init::create_schema(&pool).await?;
    Ok(pool)
}
