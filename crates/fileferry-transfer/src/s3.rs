//! Shared S3 connection settings.

use object_store::aws::{AmazonS3, AmazonS3Builder};

use crate::error::TransferError;

/// Connection settings for one S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Endpoint base URL, e.g. `https://files.polygon.io`.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Signing region.
    pub region: String,
}

impl S3Config {
    /// Build a client for this endpoint.
    ///
    /// Requests use path-style addressing, which every S3-compatible vendor
    /// accepts. Plain-http endpoints are allowed for local setups and tests.
    pub(crate) fn connect(&self) -> Result<AmazonS3, TransferError> {
        let store = AmazonS3Builder::new()
            .with_bucket_name(&self.bucket)
            .with_endpoint(&self.endpoint)
            .with_access_key_id(&self.access_key_id)
            .with_secret_access_key(&self.secret_access_key)
            .with_region(&self.region)
            .with_allow_http(self.endpoint.starts_with("http://"))
            .with_virtual_hosted_style_request(false)
            .build()?;
        Ok(store)
    }
}
