//! NuGet catalog crawler CLI
//!
//! Local execution entry point. State (config, cursors, package records)
//! lives under the storage directory.

use std::path::PathBuf;
use std::sync::Arc;

use catalog_crawler::{
    error::Result,
    models::Config,
    pipeline::{self, CatalogProcessor},
    services::{HttpCatalogClient, LeafProcessor, LoggingLeafProcessor},
    storage::{CursorStore, FileCursor, LocalStorage, PackageStore},
    utils::log::{header, pass_summary},
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;

/// Catalog Crawler - follows the NuGet V3 catalog
#[derive(Parser, Debug)]
#[command(
    name = "catalog-crawler",
    version,
    about = "Resumable NuGet catalog crawler"
)]
struct Cli {
    /// Path to storage directory containing config and state
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Where processed leaves go
    #[arg(long, value_enum, default_value_t = Sink::Log)]
    sink: Sink,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single pass from the cursor to now
    Run,

    /// Retry passes until one completes
    CatchUp,

    /// Run passes continuously at the configured interval
    Poll,

    /// Inspect or move the cursor
    Cursor {
        #[command(subcommand)]
        action: CursorAction,
    },

    /// Validate configuration file
    Validate,
}

#[derive(Subcommand, Debug)]
enum CursorAction {
    /// Print the stored cursor value
    Show,

    /// Store a new cursor value (RFC 3339)
    Set { value: DateTime<Utc> },

    /// Delete the cursor so the next pass starts from the default
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Sink {
    /// Log each event only
    Log,
    /// Keep package records under `{storage_dir}/packages`
    Store,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Cancel passes on Ctrl-C. The current leaf finishes first.
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping after the current leaf...");
            let _ = tx.send(true);
        }
    });
    rx
}

async fn build_processor(
    config: &Config,
    storage: &LocalStorage,
    sink: Sink,
) -> Result<CatalogProcessor> {
    header(&format!("Catalog crawler [{}]", config.processor.cursor_name));
    let client = HttpCatalogClient::from_config(&config.catalog).await?;
    let cursor = FileCursor::try_new(storage.clone(), &config.processor.cursor_name)?;
    let leaf_processor: Arc<dyn LeafProcessor> = match sink {
        Sink::Log => Arc::new(LoggingLeafProcessor::new()),
        Sink::Store => Arc::new(PackageStore::new(storage.clone())),
    };

    Ok(CatalogProcessor::new(
        Arc::new(client),
        Arc::new(cursor),
        leaf_processor,
        config.processor.clone(),
    )
    .with_shutdown(shutdown_on_ctrl_c()))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join("config.toml");
    let (config, load_error) = match Config::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(cli.verbose, &config.logging.level);

    match &load_error {
        Some(e) => log::warn!(
            "Using default configuration ({}): {}",
            config_path.display(),
            e
        ),
        None => log::info!("Loaded configuration from {}", config_path.display()),
    }

    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Run => {
            config.validate()?;
            let mut processor = build_processor(&config, &storage, cli.sink).await?;
            let outcome = processor.run_one_pass().await?;
            pass_summary("Catalog pass", outcome.summary());
        }

        Command::CatchUp => {
            config.validate()?;
            let mut processor = build_processor(&config, &storage, cli.sink).await?;
            let outcome = pipeline::run_until_success(
                &mut processor,
                config.runner.retry_delay(),
                config.runner.max_attempts,
            )
            .await?;
            if outcome.is_none() {
                log::info!("Stopped before a pass completed");
            }
        }

        Command::Poll => {
            config.validate()?;
            let mut processor = build_processor(&config, &storage, cli.sink).await?;
            log::info!(
                "Polling every {}s (Ctrl-C to stop)",
                config.runner.poll_interval_secs
            );
            pipeline::poll(&mut processor, config.runner.poll_interval()).await;
        }

        Command::Cursor { action } => {
            config.validate()?;
            let cursor = FileCursor::try_new(storage.clone(), &config.processor.cursor_name)?;
            match action {
                CursorAction::Show => match cursor.get().await? {
                    Some(value) => log::info!("Cursor '{}': {}", cursor.name(), value.to_rfc3339()),
                    None => log::info!("Cursor '{}' is not set", cursor.name()),
                },
                CursorAction::Set { value } => {
                    cursor.set(value).await?;
                    log::info!("Cursor '{}' set to {}", cursor.name(), value.to_rfc3339());
                }
                CursorAction::Reset => cursor.reset().await?,
            }
        }

        Command::Validate => {
            log::info!("Validating {}...", config_path.display());

            if let Err(e) = Config::load_validated(&config_path) {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    log::info!("Done!");

    Ok(())
}
