//! Serve command: run the job dispatcher loop.

use std::time::Duration;

use clap::Args;
use georama::config::Settings;
use tracing::info;

use super::common::build_dispatcher;
use crate::error::CliError;

/// Arguments for the serve command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Seconds to sleep when the job queue is empty
    #[arg(long, default_value_t = 1)]
    pub poll_interval: u64,

    /// Run the consistency sweep before draining the queue
    #[arg(long)]
    pub init_data: bool,
}

/// Runs the dispatcher until the process is terminated.
pub async fn run(args: ServeArgs) -> Result<(), CliError> {
    let settings = Settings::from_env();
    let (_pool, dispatcher) = build_dispatcher(&settings).await?;

    if args.init_data {
        info!("running consistency sweep before serving");
        georama::reconciler::initialize_data(&dispatcher).await?;
    }

    info!(version = georama::VERSION, "georama serving");
    dispatcher.run(Duration::from_secs(args.poll_interval)).await;
    Ok(())
}
