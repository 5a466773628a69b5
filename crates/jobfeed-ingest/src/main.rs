//! Jobfeed - Adzuna to Data Lake ingestion function

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobfeed_common::logging::{init_logging, LogConfig, LogLevel};
use jobfeed_ingest::{
    config::IngestConfig,
    server::{self, AppState},
    task::IngestTask,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "jobfeed")]
#[command(author, version, about = "Land Adzuna job listings in Azure Data Lake Storage")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP trigger as an Azure Functions custom handler (default)
    Serve,

    /// Run one ingestion immediately and exit
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .filter_directives("hyper=info,reqwest=info")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    let config = Arc::new(IngestConfig::load().context("Invalid configuration")?);
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let task = IngestTask::new(config.clone(), http);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("Starting jobfeed custom handler");
            server::serve(&config.server, AppState::new(task)).await?;
        },
        Command::Run => {
            let report = task.run().await?;
            info!(
                path = %report.path,
                items = report.items,
                skipped_pages = report.failed_pages.len(),
                "Ingestion complete"
            );
            println!("{}", report.message());
        },
    }

    Ok(())
}
