//! Source bucket client: listing and download.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use object_store::ObjectStore;
use object_store::aws::AmazonS3;
use object_store::path::Path as ObjectPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::TransferError;
use crate::keys::date_from_key;
use crate::s3::S3Config;

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;

/// Lists candidate objects and downloads them for processing.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Keys under the configured prefix matching the configured suffix,
    /// optionally bounded by the dates embedded in their names. Sorted.
    async fn list_keys(
        &self,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<String>, TransferError>;

    /// Download one object into `dest_dir` and return the local path.
    async fn fetch(&self, item_key: &str, dest_dir: &Path) -> Result<PathBuf, TransferError>;
}

/// S3-compatible source bucket.
pub struct S3Source {
    store: AmazonS3,
    prefix: String,
    suffix: String,
}

impl S3Source {
    pub fn new(
        config: &S3Config,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Result<Self, TransferError> {
        Ok(Self {
            store: config.connect()?,
            prefix: prefix.into(),
            suffix: suffix.into(),
        })
    }

    async fn download_to(&self, item_key: &str, local_path: &Path) -> Result<(), TransferError> {
        let object = self.store.get(&ObjectPath::from(item_key)).await?;
        let mut stream = object.into_stream();
        let mut file = tokio::fs::File::create(local_path).await?;
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl SourceClient for S3Source {
    async fn list_keys(
        &self,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<String>, TransferError> {
        let prefix = ObjectPath::from(self.prefix.as_str());
        let mut listing = self.store.list(Some(&prefix));

        let mut keys = Vec::new();
        while let Some(meta) = listing.next().await {
            let meta = meta?;
            let key = meta.location.to_string();
            if !key.ends_with(&self.suffix) {
                continue;
            }
            let Some(date) = date_from_key(&key) else {
                warn!(item_key = %key, "No date in key name, skipping");
                continue;
            };
            if from.is_some_and(|bound| date < bound) || until.is_some_and(|bound| date > bound) {
                continue;
            }
            keys.push(key);
        }
        keys.sort();
        debug!(prefix = %self.prefix, count = keys.len(), "Listed source objects");
        Ok(keys)
    }

    async fn fetch(&self, item_key: &str, dest_dir: &Path) -> Result<PathBuf, TransferError> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let file_name = item_key.rsplit('/').next().unwrap_or(item_key);
        let local_path = dest_dir.join(file_name);

        debug!(item_key, path = %local_path.display(), "Downloading object");
        let result = self.download_to(item_key, &local_path).await;
        if result.is_err() {
            // A half-written file must not survive to look like a finished
            // download.
            if let Err(e) = tokio::fs::remove_file(&local_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %local_path.display(), error = %e, "Could not remove partial file");
                }
            }
        }
        result.map(|_| local_path)
    }
}
