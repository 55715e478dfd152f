//! FileFerry - durable file transfer pipeline.
//!
//! Main entry point for the fileferry CLI.

mod adapters;
mod cli;
mod cmd_discover;
mod cmd_status;
mod cmd_work;

use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fileferry_config::{ConfigLoader, ConfigValidator, FerryConfig};

use crate::cli::{Cli, Commands};

/// Get the .fileferry directory path.
fn fileferry_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".fileferry"))
        .unwrap_or_else(|| PathBuf::from(".fileferry"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.fileferry/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = fileferry_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("fileferry")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // The guard must live until exit so buffered log lines get flushed.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(_guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable text format with colors)
        .with(fmt::layer().with_target(true).with_ansi(true))
        // File layer (text format without colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load and validate the config file, exiting on anything unusable.
fn load_config(path: &Path) -> FerryConfig {
    let config = match ConfigLoader::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let report = ConfigValidator::validate(&config);
    for warning in &report.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if !report.is_valid() {
        for error in &report.errors {
            eprintln!("config error at {}: {}", error.path, error.message);
        }
        std::process::exit(2);
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(&cli.config);

    match cli.command {
        Commands::Discover { mode } => cmd_discover::handle_discover_command(mode, &config).await,
        Commands::Work {
            once,
            poll_interval_secs,
        } => cmd_work::handle_work_command(&config, once, poll_interval_secs).await,
        Commands::Status { format } => cmd_status::handle_status_command(&config, &format).await,
    }
}
