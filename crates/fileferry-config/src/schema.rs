//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FerryConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub destination: DestinationConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

/// Task store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file. Tilde expansion applies.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "data/fileferry.db".to_string()
}

/// Source bucket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// S3-compatible endpoint URL.
    #[serde(default = "default_source_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_source_bucket")]
    pub bucket: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Key prefix for the dataset to ferry.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Filename suffix listed keys must carry.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_source_endpoint(),
            bucket: default_source_bucket(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: default_region(),
            prefix: default_prefix(),
            suffix: default_suffix(),
        }
    }
}

fn default_source_endpoint() -> String {
    "https://files.polygon.io".to_string()
}

fn default_source_bucket() -> String {
    "flatfiles".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_prefix() -> String {
    "us_stocks_sip/day_aggs_v1".to_string()
}

fn default_suffix() -> String {
    ".csv.gz".to_string()
}

/// Destination bucket configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// S3-compatible endpoint URL.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default = "default_region")]
    pub region: String,
}

/// Worker process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Owner identity recorded on claimed tasks. Defaults to a
    /// process-derived id when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Idle sleep between polls, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Scratch directory for in-flight downloads. Tilde expansion applies.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// Age in seconds after which an owned in-flight task counts as
    /// abandoned. Zero disables the sweep.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

impl WorkerConfig {
    /// Configured id, or one derived from the process id.
    pub fn effective_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("worker-{}", std::process::id()),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: None,
            poll_interval_secs: default_poll_interval(),
            work_dir: default_work_dir(),
            stale_after_secs: default_stale_after(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}

fn default_work_dir() -> String {
    "data/incoming".to_string()
}

fn default_stale_after() -> u64 {
    1800
}

/// Claim and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Total attempts a task gets before permanent failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Bounded tries per claim cycle.
    #[serde(default = "default_claim_retries")]
    pub claim_retries: u32,

    /// Linear backoff step between claim tries, in milliseconds.
    #[serde(default = "default_claim_backoff")]
    pub claim_backoff_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            claim_retries: default_claim_retries(),
            claim_backoff_ms: default_claim_backoff(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_claim_retries() -> u32 {
    5
}

fn default_claim_backoff() -> u64 {
    100
}
