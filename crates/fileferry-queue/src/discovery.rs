//! Idempotent discovery of new work items.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::QueueError;
use crate::store::{InsertOutcome, TaskStore};

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;

/// Totals for one discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Tasks newly inserted.
    pub added: u64,
    /// Candidates already tracked, in any status.
    pub skipped: u64,
}

impl DiscoveryReport {
    /// Candidates examined in total.
    pub fn total(&self) -> u64 {
        self.added + self.skipped
    }
}

/// Feeds candidate item keys into the task store, once each.
///
/// Rediscovering a key never touches the existing row: a completed task
/// stays completed and a failed one keeps its attempt history.
pub struct DiscoveryGate {
    store: Arc<dyn TaskStore>,
}

impl DiscoveryGate {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Record a batch of candidate keys and report what happened.
    ///
    /// The batch is not transactional; a concurrent discoverer inserting the
    /// same key loses the race inside the store and lands in the skipped
    /// count rather than erroring.
    pub async fn record<I, S>(&self, keys: I) -> Result<DiscoveryReport, QueueError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = DiscoveryReport::default();
        for key in keys {
            let key = key.as_ref();
            match self.store.find_by_key(key).await? {
                Some(existing) => {
                    debug!(item_key = key, status = %existing.status, "Task already tracked");
                    report.skipped += 1;
                }
                None => match self.store.insert_if_absent(key).await? {
                    InsertOutcome::Inserted => {
                        debug!(item_key = key, "Task added");
                        report.added += 1;
                    }
                    InsertOutcome::AlreadyPresent => {
                        debug!(item_key = key, "Task appeared concurrently, skipping");
                        report.skipped += 1;
                    }
                },
            }
        }

        info!(
            added = report.added,
            skipped = report.skipped,
            total = report.total(),
            "Discovery run finished"
        );
        Ok(report)
    }
}
