//! Status subcommand handler.

use std::sync::Arc;

use fileferry_config::FerryConfig;
use fileferry_queue::TaskStore;

use crate::adapters;

/// Handle the status subcommand.
pub(crate) async fn handle_status_command(
    config: &FerryConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn TaskStore> = Arc::new(adapters::open_store(config).await?);
    let counts = store.counts_by_status().await?;

    if counts.is_empty() {
        println!("No tasks discovered yet.");
        return Ok(());
    }

    match format {
        "json" => {
            let map: serde_json::Map<String, serde_json::Value> = counts
                .iter()
                .map(|(status, count)| {
                    (status.as_str().to_string(), serde_json::Value::from(*count))
                })
                .collect();
            let json = serde_json::to_string_pretty(&serde_json::Value::Object(map))?;
            println!("{}", json);
        }
        _ => {
            println!("{:<20} {:>8}", "STATUS", "COUNT");
            println!("{}", "-".repeat(29));
            let mut total: i64 = 0;
            for (status, count) in &counts {
                println!("{:<20} {:>8}", status.as_str(), count);
                total += count;
            }
            println!("{}", "-".repeat(29));
            println!("{:<20} {:>8}", "TOTAL", total);
        }
    }

    Ok(())
}
