//! Task persistence store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::QueueError;
use crate::task::{Task, TaskStatus};

/// Outcome of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was created.
    Inserted,
    /// A row with this item key already exists. Not an error.
    AlreadyPresent,
}

/// Field changes for a single conditional task update.
///
/// The store applies a `TaskUpdate` as one UPDATE statement, so either every
/// change lands or none does. `None` fields are left untouched. The guard
/// fields narrow the WHERE clause; a guarded update that matches no row
/// affects zero rows instead of writing.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New status.
    pub status: Option<TaskStatus>,
    /// New owner. `Some(None)` clears the owner.
    pub owner: Option<Option<String>>,
    /// New claim timestamp.
    pub last_attempted_at: Option<DateTime<Utc>>,
    /// Completion timestamp. Set once, on success only.
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure detail. Left untouched when `None`.
    pub error_message: Option<String>,
    /// Increment `attempt_count` by one, in place.
    pub bump_attempt: bool,
    /// Require the row to still hold this status.
    pub guard_status: Option<TaskStatus>,
    /// Require the row to still hold this attempt count.
    pub guard_attempts: Option<u32>,
}

impl TaskUpdate {
    /// Take ownership of a candidate row.
    ///
    /// Guards on the candidate's observed status and attempt count, so a row
    /// that changed hands since the candidate read cannot be claimed twice or
    /// lose an increment. The attempt bump happens in the same statement.
    pub fn claim(owner: impl Into<String>, candidate: &Task) -> Self {
        TaskUpdate {
            status: Some(TaskStatus::Processing),
            owner: Some(Some(owner.into())),
            last_attempted_at: Some(Utc::now()),
            bump_attempt: true,
            guard_status: Some(candidate.status),
            guard_attempts: Some(candidate.attempt_count),
            ..TaskUpdate::default()
        }
    }

    /// Record the download checkpoint. The owner keeps the task for upload.
    pub fn mark_downloaded() -> Self {
        TaskUpdate {
            status: Some(TaskStatus::Downloaded),
            ..TaskUpdate::default()
        }
    }

    /// Record final success and release ownership.
    pub fn complete() -> Self {
        TaskUpdate {
            status: Some(TaskStatus::Completed),
            owner: Some(None),
            completed_at: Some(Utc::now()),
            ..TaskUpdate::default()
        }
    }

    /// Record a failure outcome and release ownership.
    ///
    /// Used for retryable failures and for permanent failure alike; the
    /// caller picks the status.
    pub fn fail(status: TaskStatus, error: impl Into<String>) -> Self {
        TaskUpdate {
            status: Some(status),
            owner: Some(None),
            error_message: Some(error.into()),
            ..TaskUpdate::default()
        }
    }
}

/// Task store trait for persistence.
///
/// The store holds rows and applies conditional single-row updates. Retry
/// policy values always arrive as parameters; none live here.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task for `item_key` unless one already exists.
    async fn insert_if_absent(&self, item_key: &str) -> Result<InsertOutcome, QueueError>;

    /// Load a task by its item key.
    async fn find_by_key(&self, item_key: &str) -> Result<Option<Task>, QueueError>;

    /// Load a task by ID.
    async fn get(&self, id: i64) -> Result<Option<Task>, QueueError>;

    /// Select one claim candidate: unowned, available or retryably failed
    /// with attempts remaining, fewest attempts first, then oldest.
    async fn next_eligible(&self, max_attempts: u32) -> Result<Option<Task>, QueueError>;

    /// Apply `update` to the row with `id` as a single conditional UPDATE.
    ///
    /// `expected_owner` of `None` requires the row to be unowned (the claim
    /// path); `Some(worker)` requires that exact owner (every transition made
    /// by the owning worker). Returns the number of rows affected: 1 when
    /// the condition held, 0 when another writer got there first.
    async fn update_fields(
        &self,
        id: i64,
        expected_owner: Option<&str>,
        update: TaskUpdate,
    ) -> Result<usize, QueueError>;

    /// Release rows stranded in an owned status by a crashed worker.
    ///
    /// Rows owned, in flight, and last claimed before `stale_after` ago are
    /// released to the matching retryable failure, or to permanent failure
    /// when the attempt budget is spent. Returns how many rows were
    /// reclaimed.
    async fn reclaim_stale(
        &self,
        stale_after: std::time::Duration,
        max_attempts: u32,
    ) -> Result<usize, QueueError>;

    /// Row counts per status, for reporting.
    async fn counts_by_status(&self) -> Result<Vec<(TaskStatus, i64)>, QueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(status: TaskStatus, attempts: u32) -> Task {
        Task {
            id: 7,
            item_key: "k".to_string(),
            status,
            owner: None,
            discovered_at: Utc::now(),
            last_attempted_at: None,
            completed_at: None,
            attempt_count: attempts,
            error_message: None,
        }
    }

    #[test]
    fn claim_update_guards_on_candidate() {
        let update = TaskUpdate::claim("worker-1", &candidate(TaskStatus::FailedDownload, 2));
        assert_eq!(update.status, Some(TaskStatus::Processing));
        assert_eq!(update.owner, Some(Some("worker-1".to_string())));
        assert!(update.bump_attempt);
        assert!(update.last_attempted_at.is_some());
        assert_eq!(update.guard_status, Some(TaskStatus::FailedDownload));
        assert_eq!(update.guard_attempts, Some(2));
    }

    #[test]
    fn complete_update_releases_and_stamps() {
        let update = TaskUpdate::complete();
        assert_eq!(update.status, Some(TaskStatus::Completed));
        assert_eq!(update.owner, Some(None));
        assert!(update.completed_at.is_some());
        // Success keeps whatever failure detail was recorded earlier.
        assert!(update.error_message.is_none());
    }

    #[test]
    fn fail_update_releases_with_message() {
        let update = TaskUpdate::fail(TaskStatus::FailedUpload, "connection reset");
        assert_eq!(update.status, Some(TaskStatus::FailedUpload));
        assert_eq!(update.owner, Some(None));
        assert_eq!(update.error_message.as_deref(), Some("connection reset"));
        assert!(!update.bump_attempt);
    }

    #[test]
    fn downloaded_update_keeps_owner() {
        let update = TaskUpdate::mark_downloaded();
        assert_eq!(update.status, Some(TaskStatus::Downloaded));
        assert!(update.owner.is_none());
    }
}
