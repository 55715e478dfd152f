//! Worker poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fileferry_queue::{Claimer, QueueError, TaskStatus, TaskStore, TaskUpdate};

use crate::pipeline::TaskProcessor;

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

/// Identity and pacing for one worker process.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Owner identity recorded on claimed tasks.
    pub worker_id: String,
    /// Idle sleep between polls when no task is available.
    pub poll_interval: Duration,
    /// Age after which an owned in-flight task counts as abandoned.
    /// Zero disables the sweep.
    pub stale_after: Duration,
}

/// Single-threaded claim-and-process loop.
pub struct Worker {
    processor: TaskProcessor,
    claimer: Claimer,
    store: Arc<dyn TaskStore>,
    options: WorkerOptions,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        store: Arc<dyn TaskStore>,
        claimer: Claimer,
        processor: TaskProcessor,
        options: WorkerOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            processor,
            claimer,
            store,
            options,
            cancel,
        }
    }

    /// Claim and process at most one task.
    ///
    /// Returns whether a task was claimed. The pipeline runs in a spawned
    /// task; a panic in a transfer client is contained by the join handle
    /// and the task goes back to the pool with its attempt spent.
    pub async fn run_once(&self) -> Result<bool, QueueError> {
        let Some(task) = self
            .claimer
            .claim(&self.options.worker_id, &self.cancel)
            .await?
        else {
            return Ok(false);
        };

        let task_id = task.id;
        let attempt = task.attempt_count;
        let item_key = task.item_key.clone();

        let processor = self.processor.clone();
        let handle = tokio::spawn(async move { processor.process(&task).await });

        match handle.await {
            Ok(Ok(outcome)) => {
                debug!(task_id, item_key = %item_key, ?outcome, "Task processed");
            }
            Ok(Err(e)) => {
                error!(task_id, item_key = %item_key, error = %e, "Task processing error");
                self.release_after_crash(task_id, attempt, &format!("Task processing error: {e}"))
                    .await;
            }
            Err(e) if e.is_panic() => {
                error!(task_id, item_key = %item_key, "Task processing panicked");
                self.release_after_crash(task_id, attempt, "Task processing panicked")
                    .await;
            }
            Err(e) => {
                error!(task_id, item_key = %item_key, error = %e, "Task processing aborted");
                self.release_after_crash(task_id, attempt, "Task processing aborted")
                    .await;
            }
        }

        Ok(true)
    }

    /// Poll until cancelled.
    ///
    /// Each iteration sweeps stale owners, claims, and processes. With the
    /// pool drained the loop sleeps for the poll interval; cancellation is
    /// honored mid-sleep.
    pub async fn run(&self) {
        info!(worker_id = %self.options.worker_id, "Worker started");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.sweep_stale().await;

            match self.run_once().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    error!(worker_id = %self.options.worker_id, error = %e, "Poll cycle failed");
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }

        info!(worker_id = %self.options.worker_id, "Worker has shut down");
    }

    /// Put a task back after its pipeline died mid-flight.
    ///
    /// The claim already spent the attempt, so the budget check uses the
    /// claim-time number. A zero-row update means the row was released
    /// elsewhere in the meantime and needs nothing from us.
    async fn release_after_crash(&self, task_id: i64, attempt: u32, reason: &str) {
        let status = if attempt >= self.claimer.policy().max_attempts {
            TaskStatus::PermanentFailure
        } else {
            TaskStatus::FailedDownload
        };
        let update = TaskUpdate::fail(status, reason);
        match self
            .store
            .update_fields(task_id, Some(&self.options.worker_id), update)
            .await
        {
            Ok(1) => warn!(task_id, status = %status, "Released task after crash"),
            Ok(_) => debug!(task_id, "Task already released"),
            Err(e) => error!(task_id, error = %e, "Could not release task after crash"),
        }
    }

    async fn sweep_stale(&self) {
        if self.options.stale_after.is_zero() {
            return;
        }
        match self
            .store
            .reclaim_stale(self.options.stale_after, self.claimer.policy().max_attempts)
            .await
        {
            Ok(0) => {}
            Ok(n) => warn!(count = n, "Reclaimed tasks from stale owners"),
            Err(e) => warn!(error = %e, "Stale-task sweep failed"),
        }
    }
}
