//! Transfer errors.

use thiserror::Error;

/// Transfer error types.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Remote object store operation failed.
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
