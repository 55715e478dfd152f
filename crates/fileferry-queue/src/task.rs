//! Task definition and lifecycle statuses.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
///
/// Stored as text in the task table; `as_str` and `FromStr` round-trip the
/// stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Discovered, never claimed. Eligible for claiming.
    Available,
    /// Claimed by a worker, download in progress.
    Processing,
    /// Download finished, upload pending. Still owned.
    Downloaded,
    /// Transferred successfully. Terminal.
    Completed,
    /// Download failed. Eligible again while attempts remain.
    FailedDownload,
    /// Upload failed. Eligible again while attempts remain.
    FailedUpload,
    /// Retry budget exhausted. Terminal.
    PermanentFailure,
}

impl TaskStatus {
    /// Stored text form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Available => "available",
            TaskStatus::Processing => "processing",
            TaskStatus::Downloaded => "downloaded",
            TaskStatus::Completed => "completed",
            TaskStatus::FailedDownload => "failed_download",
            TaskStatus::FailedUpload => "failed_upload",
            TaskStatus::PermanentFailure => "permanent_failure",
        }
    }

    /// True for states that admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::PermanentFailure)
    }

    /// True for failure states a claim may pick up again.
    pub fn is_retryable_failure(&self) -> bool {
        matches!(self, TaskStatus::FailedDownload | TaskStatus::FailedUpload)
    }

    /// True for states held under an owner mid-pipeline.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TaskStatus::Processing | TaskStatus::Downloaded)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for status text that names no known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown task status: {}", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(TaskStatus::Available),
            "processing" => Ok(TaskStatus::Processing),
            "downloaded" => Ok(TaskStatus::Downloaded),
            "completed" => Ok(TaskStatus::Completed),
            "failed_download" => Ok(TaskStatus::FailedDownload),
            "failed_upload" => Ok(TaskStatus::FailedUpload),
            "permanent_failure" => Ok(TaskStatus::PermanentFailure),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// One unit of work: a single remote object to ferry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Row identifier, assigned by the store.
    pub id: i64,
    /// Remote object key. Unique across all tasks.
    pub item_key: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Worker currently holding the task, if any.
    pub owner: Option<String>,
    /// When the task was first inserted.
    pub discovered_at: DateTime<Utc>,
    /// When a worker last claimed the task.
    pub last_attempted_at: Option<DateTime<Utc>>,
    /// When the task completed. Set once, on success only.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of claims so far. Incremented by the claim itself.
    pub attempt_count: u32,
    /// Detail of the most recent failure.
    pub error_message: Option<String>,
}

impl Task {
    /// Whether this task can still be claimed under the given retry budget.
    pub fn is_eligible(&self, max_attempts: u32) -> bool {
        self.owner.is_none()
            && (self.status == TaskStatus::Available
                || (self.status.is_retryable_failure() && self.attempt_count < max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_round_trips() {
        for status in [
            TaskStatus::Available,
            TaskStatus::Processing,
            TaskStatus::Downloaded,
            TaskStatus::Completed,
            TaskStatus::FailedDownload,
            TaskStatus::FailedUpload,
            TaskStatus::PermanentFailure,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "exploded".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.0, "exploded");
    }

    #[test]
    fn terminal_and_retryable_partition() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::PermanentFailure.is_terminal());
        assert!(!TaskStatus::FailedDownload.is_terminal());
        assert!(TaskStatus::FailedDownload.is_retryable_failure());
        assert!(TaskStatus::FailedUpload.is_retryable_failure());
        assert!(!TaskStatus::Available.is_retryable_failure());
        assert!(TaskStatus::Processing.is_in_flight());
        assert!(TaskStatus::Downloaded.is_in_flight());
        assert!(!TaskStatus::Completed.is_in_flight());
    }

    #[test]
    fn eligibility_respects_attempt_budget() {
        let mut task = Task {
            id: 1,
            item_key: "data/2024/2024-01-02.csv.gz".to_string(),
            status: TaskStatus::Available,
            owner: None,
            discovered_at: Utc::now(),
            last_attempted_at: None,
            completed_at: None,
            attempt_count: 0,
            error_message: None,
        };
        assert!(task.is_eligible(3));

        task.status = TaskStatus::FailedDownload;
        task.attempt_count = 2;
        assert!(task.is_eligible(3));

        task.attempt_count = 3;
        assert!(!task.is_eligible(3));

        task.status = TaskStatus::Available;
        task.owner = Some("worker-1".to_string());
        assert!(!task.is_eligible(3));
    }
}
