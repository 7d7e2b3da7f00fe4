//! Enqueue command: submit a job from a descriptor.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use georama::config::Settings;
use georama::models::JobType;

use crate::error::CliError;

/// Arguments for the enqueue command.
#[derive(Debug, Args)]
pub struct EnqueueArgs {
    /// Job type, e.g. MAPS_CREATE or TRANSFORMATION_SET
    pub job_type: String,

    /// Path to the JSON descriptor file
    pub descriptor: PathBuf,

    /// User recorded on the job row
    #[arg(long, default_value = "cli")]
    pub user: String,
}

/// Validates the descriptor and inserts the job row.
pub async fn run(args: EnqueueArgs) -> Result<(), CliError> {
    let job_type =
        JobType::from_str(&args.job_type).map_err(|_| CliError::JobType(args.job_type.clone()))?;

    let descriptor = fs::read_to_string(&args.descriptor).map_err(|error| CliError::FileRead {
        path: args.descriptor.clone(),
        error,
    })?;
    // Shape errors surface when the job runs; only well-formedness is
    // checked at submission time.
    serde_json::from_str::<serde_json::Value>(&descriptor)?;

    let settings = Settings::from_env();
    let pool = georama::db::connect(&settings.database).await?;
    let job_id = georama::db::jobs::insert(&pool, &args.user, job_type, &descriptor).await?;

    println!("Enqueued {} job {}", job_type, job_id);
    Ok(())
}
