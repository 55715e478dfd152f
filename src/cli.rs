//! CLI definitions for FileFerry.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// FileFerry CLI.
#[derive(Parser)]
#[command(name = "fileferry")]
#[command(about = "Durable work-queue pipeline ferrying files between object stores")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "fileferry.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Discover source files and enqueue them as tasks
    Discover {
        #[command(subcommand)]
        mode: DiscoverMode,
    },

    /// Claim and process tasks until stopped
    Work {
        /// Process at most one task, then exit
        #[arg(long)]
        once: bool,

        /// Override the configured poll interval, in seconds
        #[arg(long)]
        poll_interval_secs: Option<u64>,
    },

    /// Show task counts by status
    Status {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum DiscoverMode {
    /// List the source bucket and enqueue everything within the date bounds
    Historical {
        /// Earliest date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest date to include (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Enqueue yesterday's file
    Daily,

    /// Enqueue files for specific dates
    Dates {
        /// Dates to enqueue (YYYY-MM-DD), unparseable entries are skipped
        dates: Vec<String>,
    },
}
