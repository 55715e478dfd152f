//! Per-task transfer pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use fileferry_queue::{QueueError, Task, TaskStatus, TaskStore, TaskUpdate};
use fileferry_transfer::{DestinationClient, SourceClient};

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

/// Where a processed task ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Ferried end to end.
    Completed,
    /// Download failed, attempts remain.
    FailedDownload,
    /// Upload failed, attempts remain.
    FailedUpload,
    /// Failed on the final attempt. No further retries.
    PermanentFailure,
}

/// Drives one claimed task through download and upload.
///
/// Clones share the underlying clients, so the runner can hand a clone to a
/// spawned task per claim.
#[derive(Clone)]
pub struct TaskProcessor {
    store: Arc<dyn TaskStore>,
    source: Arc<dyn SourceClient>,
    destination: Arc<dyn DestinationClient>,
    worker_id: String,
    work_dir: PathBuf,
    max_attempts: u32,
}

impl TaskProcessor {
    pub fn new(
        store: Arc<dyn TaskStore>,
        source: Arc<dyn SourceClient>,
        destination: Arc<dyn DestinationClient>,
        worker_id: impl Into<String>,
        work_dir: PathBuf,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            source,
            destination,
            worker_id: worker_id.into(),
            work_dir,
            max_attempts,
        }
    }

    /// Process one task the calling worker already owns.
    ///
    /// Permanence is decided from the claim-time attempt number carried on
    /// `task`, never from a re-read; a fresh read could already reflect a
    /// later claim. Returns where the task ended up. `Err` means a store
    /// update could not be made at all.
    pub async fn process(&self, task: &Task) -> Result<TaskOutcome, QueueError> {
        let attempt = task.attempt_count;

        let local_path = match self.source.fetch(&task.item_key, &self.work_dir).await {
            Ok(path) => path,
            Err(e) => {
                let (outcome, update) = if attempt >= self.max_attempts {
                    error!(
                        task_id = task.id,
                        item_key = %task.item_key,
                        attempt,
                        error = %e,
                        "Download failed on final attempt"
                    );
                    (
                        TaskOutcome::PermanentFailure,
                        TaskUpdate::fail(
                            TaskStatus::PermanentFailure,
                            format!("Download failed after {attempt} attempts: {e}"),
                        ),
                    )
                } else {
                    warn!(
                        task_id = task.id,
                        item_key = %task.item_key,
                        attempt,
                        error = %e,
                        "Download failed, will retry"
                    );
                    (
                        TaskOutcome::FailedDownload,
                        TaskUpdate::fail(TaskStatus::FailedDownload, format!("Download failed: {e}")),
                    )
                };
                self.record(task, update).await?;
                return Ok(outcome);
            }
        };

        // Checkpoint so a later crash is released as an upload problem.
        self.record(task, TaskUpdate::mark_downloaded()).await?;

        let outcome = match self.destination.store(&local_path, &task.item_key).await {
            Ok(()) => {
                self.record(task, TaskUpdate::complete()).await?;
                info!(
                    task_id = task.id,
                    item_key = %task.item_key,
                    attempt,
                    "Task completed"
                );
                TaskOutcome::Completed
            }
            Err(e) => {
                let (outcome, update) = if attempt >= self.max_attempts {
                    error!(
                        task_id = task.id,
                        item_key = %task.item_key,
                        attempt,
                        error = %e,
                        "Upload failed on final attempt"
                    );
                    (
                        TaskOutcome::PermanentFailure,
                        TaskUpdate::fail(
                            TaskStatus::PermanentFailure,
                            format!("Upload failed after {attempt} attempts: {e}"),
                        ),
                    )
                } else {
                    warn!(
                        task_id = task.id,
                        item_key = %task.item_key,
                        attempt,
                        error = %e,
                        "Upload failed, will retry"
                    );
                    (
                        TaskOutcome::FailedUpload,
                        TaskUpdate::fail(TaskStatus::FailedUpload, format!("Upload failed: {e}")),
                    )
                };
                self.record(task, update).await?;
                outcome
            }
        };

        if let Err(e) = tokio::fs::remove_file(&local_path).await {
            warn!(path = %local_path.display(), error = %e, "Could not remove local file");
        }

        Ok(outcome)
    }

    /// Apply an update scoped to this worker's ownership of the task.
    async fn record(&self, task: &Task, update: TaskUpdate) -> Result<(), QueueError> {
        let affected = self
            .store
            .update_fields(task.id, Some(&self.worker_id), update)
            .await?;
        if affected == 0 {
            // The stale sweep can take a row back mid-flight.
            warn!(
                task_id = task.id,
                item_key = %task.item_key,
                "Task no longer owned by this worker, update skipped"
            );
        }
        Ok(())
    }
}
