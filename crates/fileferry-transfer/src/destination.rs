//! Destination bucket client: upload.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use crate::error::TransferError;
use crate::s3::S3Config;

#[cfg(test)]
#[path = "destination_tests.rs"]
mod tests;

/// Uploads finished files under their item key.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Upload the file at `local_path` as `item_key`.
    async fn store(&self, local_path: &Path, item_key: &str) -> Result<(), TransferError>;
}

/// S3-compatible destination bucket.
pub struct S3Destination {
    store: AmazonS3,
}

impl S3Destination {
    pub fn new(config: &S3Config) -> Result<Self, TransferError> {
        Ok(Self {
            store: config.connect()?,
        })
    }
}

#[async_trait]
impl DestinationClient for S3Destination {
    async fn store(&self, local_path: &Path, item_key: &str) -> Result<(), TransferError> {
        let data = tokio::fs::read(local_path).await?;
        let size = data.len();
        let payload = PutPayload::from(Bytes::from(data));
        self.store.put(&ObjectPath::from(item_key), payload).await?;
        debug!(item_key, size, "Uploaded object");
        Ok(())
    }
}
