//! Atomic task claiming.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::QueueError;
use crate::store::{TaskStore, TaskUpdate};
use crate::task::Task;

#[cfg(test)]
#[path = "claim_tests.rs"]
mod tests;

/// Retry tuning for claiming and attempt budgets.
#[derive(Debug, Clone)]
pub struct ClaimPolicy {
    /// Total attempts a task gets before permanent failure.
    pub max_attempts: u32,
    /// Bounded tries per claim cycle before reporting no task.
    pub claim_retries: u32,
    /// Base delay between claim tries, in milliseconds. Grows linearly.
    pub claim_backoff_ms: u64,
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        ClaimPolicy {
            max_attempts: 3,
            claim_retries: 5,
            claim_backoff_ms: 100,
        }
    }
}

/// Claims tasks on behalf of a single worker.
///
/// The claim cycle selects a candidate, then takes it with a conditional
/// update. Whoever gets `rows_affected == 1` owns the task; everyone else
/// lost the race and tries again. No lock is held between the two steps.
pub struct Claimer {
    store: Arc<dyn TaskStore>,
    policy: ClaimPolicy,
}

impl Claimer {
    pub fn new(store: Arc<dyn TaskStore>, policy: ClaimPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &ClaimPolicy {
        &self.policy
    }

    /// Claim the next eligible task for `owner`.
    ///
    /// `Ok(None)` means no task is available right now. That covers an empty
    /// pool, losing every race within the retry bound, and a store that
    /// stayed unreachable across the bounded tries; the caller polls again
    /// later either way.
    pub async fn claim(
        &self,
        owner: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Task>, QueueError> {
        for round in 0..self.policy.claim_retries {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            let candidate = match self.store.next_eligible(self.policy.max_attempts).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => {
                    debug!(owner, "No eligible task");
                    return Ok(None);
                }
                Err(e) => {
                    warn!(owner, error = %e, "Candidate query failed, backing off");
                    if !self.backoff(round, cancel).await {
                        return Ok(None);
                    }
                    continue;
                }
            };

            let update = TaskUpdate::claim(owner, &candidate);
            match self.store.update_fields(candidate.id, None, update).await {
                Ok(1) => {
                    let claimed = self
                        .store
                        .get(candidate.id)
                        .await?
                        .ok_or(QueueError::TaskNotFound(candidate.id))?;
                    info!(
                        owner,
                        task_id = claimed.id,
                        item_key = %claimed.item_key,
                        attempt = claimed.attempt_count,
                        "Claimed task"
                    );
                    return Ok(Some(claimed));
                }
                Ok(_) => {
                    debug!(owner, task_id = candidate.id, "Lost claim race");
                }
                Err(e) => {
                    warn!(owner, error = %e, "Claim update failed, backing off");
                }
            }

            if !self.backoff(round, cancel).await {
                return Ok(None);
            }
        }

        info!(
            owner,
            tries = self.policy.claim_retries,
            "No task claimed this cycle"
        );
        Ok(None)
    }

    /// Linear backoff. Returns false when cancelled mid-sleep.
    async fn backoff(&self, round: u32, cancel: &CancellationToken) -> bool {
        let delay = Duration::from_millis(self.policy.claim_backoff_ms * (u64::from(round) + 1));
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
