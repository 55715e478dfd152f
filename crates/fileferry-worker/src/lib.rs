//! # FileFerry Worker
//!
//! Claim-and-transfer loop for FileFerry worker processes.
//!
//! ## Features
//!
//! - Claims one task at a time and ferries it from source to destination
//! - Contains panics from transfer code; a bad task never kills the loop
//! - Releases crashed tasks back to the pool with their attempt spent
//! - Sweeps tasks stranded by dead workers back into the pool
//! - Cancellation-aware polling for clean shutdown

pub mod pipeline;
pub mod runner;
pub mod shutdown;

pub use pipeline::{TaskOutcome, TaskProcessor};
pub use runner::{Worker, WorkerOptions};
pub use shutdown::shutdown_token;
