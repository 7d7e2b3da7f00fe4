//! CLI error handling with user-friendly messages.

use std::path::PathBuf;
use std::process;

use georama::search::IndexError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("search index error: {0}")]
    Index(#[from] IndexError),

    #[error("unknown job type '{0}'")]
    JobType(String),

    #[error("descriptor is not valid JSON: {0}")]
    Descriptor(#[from] serde_json::Error),

    #[error("failed to read '{path}': {error}")]
    FileRead {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Exits the process with an error message and a non-zero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Index(_) = self {
            eprintln!();
            eprintln!("Check that the search index is reachable and that the");
            eprintln!("GEORAMA_ES_* environment variables point at it.");
        }

        process::exit(1)
    }
}
