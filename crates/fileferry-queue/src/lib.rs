//! # FileFerry Queue
//!
//! Durable task queue for the FileFerry transfer pipeline.
//!
//! ## Features
//!
//! - One row per remote object, deduplicated by item key
//! - Atomic claim protocol: a conditional single-row update picks the winner
//! - Bounded claim retries with linear backoff
//! - Per-task attempt budget with permanent-failure escalation
//! - Stale-owner reclaim for tasks stranded by a crashed worker
//! - SQLite persistence behind an async store trait

pub mod claim;
pub mod discovery;
pub mod error;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod task;

pub use claim::{ClaimPolicy, Claimer};
pub use discovery::{DiscoveryGate, DiscoveryReport};
pub use error::QueueError;
pub use sqlite::SqliteTaskStore;
pub use store::{InsertOutcome, TaskStore, TaskUpdate};
pub use task::{Task, TaskStatus};
