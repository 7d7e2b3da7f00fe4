//! Georama - processing pipeline for historical map sheets
//!
//! This library turns imported historical map images into georeferenced
//! raster products and publishes them to a search catalog. Persisted maps
//! live in a relational database; derived artifacts (preprocessed rasters,
//! thumbnails, image pyramids, georectified rasters, tile pyramids, map
//! service files, mosaic composites) live on the filesystem; a search index
//! carries a replaceable projection of both.
//!
//! # High-Level API
//!
//! Work enters the system as rows in the `jobs` table and is drained by the
//! [`jobs::Dispatcher`]:
//!
//! ```ignore
//! use georama::config::Settings;
//! use georama::jobs::Dispatcher;
//! use georama::search::EsIndex;
//! use georama::toolchain::GdalToolchain;
//!
//! let settings = Settings::from_env();
//! let pool = georama::db::connect(&settings.database).await?;
//! let dispatcher = Dispatcher::new(
//!     pool,
//!     GdalToolchain::new(settings.gdal.clone()),
//!     EsIndex::new(&settings.index)?,
//!     &settings,
//! );
//! dispatcher.run(std::time::Duration::from_secs(1)).await;
//! ```

pub mod actions;
pub mod config;
pub mod db;
pub mod geometry;
pub mod id;
pub mod jobs;
pub mod layout;
pub mod logging;
pub mod models;
pub mod mosaic;
pub mod reconciler;
pub mod search;
pub mod toolchain;

/// Version of the georama library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
