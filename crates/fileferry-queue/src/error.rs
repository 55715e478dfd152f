//! Queue errors.

use thiserror::Error;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// Stored status text names no known state.
    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Generic error.
    #[error("{0}")]
    Custom(String),
}
