//! Wiring from configuration to runtime components.

use std::path::PathBuf;

use fileferry_config::{ConfigLoader, FerryConfig};
use fileferry_queue::{ClaimPolicy, SqliteTaskStore};
use fileferry_transfer::S3Config;

/// Open the task store, creating its parent directory if needed.
pub(crate) async fn open_store(
    config: &FerryConfig,
) -> Result<SqliteTaskStore, Box<dyn std::error::Error>> {
    let path = PathBuf::from(ConfigLoader::expand_path(&config.store.path));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteTaskStore::open(&path).await?)
}

pub(crate) fn source_s3(config: &FerryConfig) -> S3Config {
    S3Config {
        endpoint: config.source.endpoint.clone(),
        bucket: config.source.bucket.clone(),
        access_key_id: config.source.access_key_id.clone(),
        secret_access_key: config.source.secret_access_key.clone(),
        region: config.source.region.clone(),
    }
}

pub(crate) fn destination_s3(config: &FerryConfig) -> S3Config {
    S3Config {
        endpoint: config.destination.endpoint.clone(),
        bucket: config.destination.bucket.clone(),
        access_key_id: config.destination.access_key_id.clone(),
        secret_access_key: config.destination.secret_access_key.clone(),
        region: config.destination.region.clone(),
    }
}

pub(crate) fn claim_policy(config: &FerryConfig) -> ClaimPolicy {
    ClaimPolicy {
        max_attempts: config.queue.max_attempts,
        claim_retries: config.queue.claim_retries,
        claim_backoff_ms: config.queue.claim_backoff_ms,
    }
}

/// Scratch directory for in-flight downloads, tilde-expanded.
pub(crate) fn work_dir(config: &FerryConfig) -> PathBuf {
    PathBuf::from(ConfigLoader::expand_path(&config.worker.work_dir))
}
