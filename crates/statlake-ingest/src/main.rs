//! Statlake Ingest - change-detecting data lake ingestion tool

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::Parser;
use statlake_common::logging::{init_logging, LogConfig, LogLevel};
use statlake_ingest::config::Settings;
use statlake_ingest::pipeline::IngestPipeline;
use statlake_ingest::state::FingerprintStore;
use statlake_ingest::storage::Storage;
use statlake_ingest::layout;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "statlake-ingest")]
#[command(author, version, about = "Statistical data lake ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file
    #[arg(short, long, default_value = "config/settings.yaml", global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run one ingestion pass over the configured datasets
    Run {
        /// Process only the named dataset
        #[arg(short, long)]
        dataset: Option<String>,
    },

    /// Provision the bucket and create the partition layout skeleton
    Init {
        /// Last year of the skeleton (defaults to the current year)
        #[arg(long)]
        through_year: Option<i32>,
    },

    /// Print the committed fingerprint state
    State,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the verbosity flag.
    let log_config = LogConfig::from_env()
        .unwrap_or_default()
        .with_file_prefix("statlake-ingest");
    let log_config = if std::env::var("LOG_LEVEL").is_err() {
        log_config.with_level(log_level)
    } else {
        log_config
    };
    init_logging(&log_config)?;

    let mut settings = Settings::load(&cli.config)?;

    match cli.command {
        Command::Run { dataset } => {
            if let Some(name) = dataset {
                settings.select_dataset(&name)?;
            }

            let storage = Storage::new(&settings.storage).await?;
            let pipeline = IngestPipeline::new(&settings, &storage)?;
            let summary = pipeline.run().await?;

            info!(
                uploaded = summary.uploaded,
                unchanged = summary.unchanged,
                rejected = summary.rejected,
                failed = summary.failed,
                "Run complete"
            );
        },
        Command::Init { through_year } => {
            let through_year = through_year.unwrap_or_else(|| Utc::now().year());

            let storage = Storage::new(&settings.storage).await?;
            storage.ensure_bucket().await?;
            let created = layout::initialize(&settings, &storage, through_year).await?;

            info!(prefixes = created, "Initialization complete");
        },
        Command::State => {
            let store = FingerprintStore::new(&settings.local.state_file);
            let fingerprints = store.load()?;
            println!("{}", serde_json::to_string_pretty(&fingerprints)?);
        },
    }

    Ok(())
}
