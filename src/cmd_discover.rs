//! Discover subcommand handlers.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::warn;

use fileferry_config::FerryConfig;
use fileferry_queue::{DiscoveryGate, TaskStore};
use fileferry_transfer::{S3Source, SourceClient, key_for_date};

use crate::adapters;
use crate::cli::DiscoverMode;

/// Handle discover subcommands.
pub(crate) async fn handle_discover_command(
    mode: DiscoverMode,
    config: &FerryConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn TaskStore> = Arc::new(adapters::open_store(config).await?);
    let gate = DiscoveryGate::new(store);

    let keys = match mode {
        DiscoverMode::Historical { from, until } => {
            let source = S3Source::new(
                &adapters::source_s3(config),
                config.source.prefix.as_str(),
                config.source.suffix.as_str(),
            )?;
            source.list_keys(from, until).await?
        }
        DiscoverMode::Daily => {
            let yesterday = Utc::now().date_naive() - Days::new(1);
            vec![key_for_date(
                &config.source.prefix,
                &config.source.suffix,
                yesterday,
            )]
        }
        DiscoverMode::Dates { dates } => dates_to_keys(config, &dates),
    };

    let report = gate.record(keys).await?;
    println!(
        "Discovered {} new tasks ({} already known)",
        report.added, report.skipped
    );
    Ok(())
}

/// Map date arguments onto source keys, skipping entries that do not parse.
fn dates_to_keys(config: &FerryConfig, dates: &[String]) -> Vec<String> {
    dates
        .iter()
        .filter_map(|raw| match raw.parse::<NaiveDate>() {
            Ok(date) => Some(key_for_date(
                &config.source.prefix,
                &config.source.suffix,
                date,
            )),
            Err(e) => {
                warn!(date = %raw, error = %e, "Skipping unparseable date");
                None
            }
        })
        .collect()
}
