//! botreview - auto-approve dependency-bot pull requests
//!
//! Main entry point for the botreview CLI.

mod cli;
mod commands;
mod paths;
mod watch;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use botreview_cdp::CdpClient;
use botreview_config::{
    AppConfig, ConfigLoader, ConfigValidator, FileSettingsStore, LoggingConfig, Settings,
};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Log files are written to the configured directory (default
/// ~/.botreview/logs/) with daily rotation.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = paths::log_dir(logging);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("botreview")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load the configuration. An explicit path must exist; the default one may not.
fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_or_default(&paths::default_config_file())?,
    };
    Ok(config)
}

/// Report problems in the stored settings. They are re-read on every run, so
/// nothing here is fatal.
async fn check_settings(store: &FileSettingsStore) {
    match Settings::load(store).await {
        Ok(settings) => {
            let result = ConfigValidator::validate_settings(&settings);
            for error in &result.errors {
                warn!("Settings error at {}: {}", error.path, error.message);
            }
            for warning in &result.warnings {
                warn!("Settings warning at {}: {}", warning.path, warning.message);
            }
            info!(
                enabled = settings.enabled,
                reviewers = settings.reviewers.len(),
                repositories = settings.repositories.len(),
                "Settings loaded from {}",
                store.path().display()
            );
        }
        Err(e) => warn!("Settings at {} unreadable: {}", store.path().display(), e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging)?;

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }

    let settings_path = cli
        .settings
        .unwrap_or_else(|| ConfigLoader::expand_path(&config.settings.path));
    let store = FileSettingsStore::new(settings_path);

    info!("Starting botreview v{}", env!("CARGO_PKG_VERSION"));
    let client = CdpClient::connect(&config.browser.endpoint).await?;
    info!("Connected to {} at {}", client.browser(), client.endpoint());

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            check_settings(&store).await;
            watch::watch(&client, &store, &config).await
        }
        Commands::Run { target } => {
            check_settings(&store).await;
            commands::run_once(&client, &store, &config, target.as_deref()).await
        }
        Commands::Pages => commands::list_pages(&client, &config).await,
    }
}
