//! Georama CLI - pipeline operations from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "georama")]
#[command(version = georama::VERSION)]
#[command(about = "Georeferencing pipeline for historical map sheets", long_about = None)]
struct Cli {
    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the job dispatcher loop
    Serve(commands::serve::ServeArgs),
    /// Rebuild missing derived artifacts and republish the search index
    InitData,
    /// Submit a job from a JSON descriptor file
    Enqueue(commands::enqueue::EnqueueArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logging_guard =
        match georama::logging::init_logging(&cli.log_dir, georama::logging::default_log_prefix()) {
            Ok(guard) => guard,
            Err(error) => CliError::LoggingInit(error).exit(),
        };

    let result = match cli.command {
        Command::Serve(args) => commands::serve::run(args).await,
        Command::InitData => commands::init_data::run().await,
        Command::Enqueue(args) => commands::enqueue::run(args).await,
    };

    if let Err(error) = result {
        error.exit();
    }
}
