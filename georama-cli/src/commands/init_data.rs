//! Init-data command: one-shot consistency sweep.
//!
//! Rebuilds missing derived artifacts from the database and republishes
//! every search document. Safe to run against a live tree; rebuilds are
//! skip-if-present.

use georama::config::Settings;
use tracing::info;

use super::common::build_dispatcher;
use crate::error::CliError;

pub async fn run() -> Result<(), CliError> {
    let settings = Settings::from_env();
    let (_pool, dispatcher) = build_dispatcher(&settings).await?;

    georama::reconciler::initialize_data(&dispatcher).await?;
    info!("consistency sweep finished");
    Ok(())
}
