//! Work subcommand handler.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use fileferry_config::FerryConfig;
use fileferry_queue::{Claimer, TaskStore};
use fileferry_transfer::{S3Destination, S3Source};
use fileferry_worker::{TaskProcessor, Worker, WorkerOptions, shutdown_token};

use crate::adapters;

/// Handle the work subcommand.
pub(crate) async fn handle_work_command(
    config: &FerryConfig,
    once: bool,
    poll_interval_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn TaskStore> = Arc::new(adapters::open_store(config).await?);

    let source = S3Source::new(
        &adapters::source_s3(config),
        config.source.prefix.as_str(),
        config.source.suffix.as_str(),
    )?;
    let destination = S3Destination::new(&adapters::destination_s3(config))?;

    let work_dir = adapters::work_dir(config);
    std::fs::create_dir_all(&work_dir)?;

    let worker_id = config.worker.effective_id();
    let policy = adapters::claim_policy(config);

    let processor = TaskProcessor::new(
        store.clone(),
        Arc::new(source),
        Arc::new(destination),
        worker_id.clone(),
        work_dir,
        policy.max_attempts,
    );
    let claimer = Claimer::new(store.clone(), policy);
    let cancel = shutdown_token()?;
    let options = WorkerOptions {
        worker_id,
        poll_interval: Duration::from_secs(
            poll_interval_secs.unwrap_or(config.worker.poll_interval_secs),
        ),
        stale_after: Duration::from_secs(config.worker.stale_after_secs),
    };
    let worker = Worker::new(store, claimer, processor, options, cancel);

    if once {
        if worker.run_once().await? {
            info!("Processed one task");
        } else {
            info!("No task available");
        }
    } else {
        worker.run().await;
    }
    Ok(())
}
