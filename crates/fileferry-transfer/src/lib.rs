//! # FileFerry Transfer
//!
//! S3-compatible object transfer clients for the FileFerry pipeline.
//!
//! ## Features
//!
//! - Source listing with suffix and date-range filtering
//! - Streamed downloads with partial-file cleanup
//! - Uploads keyed identically to the source objects
//! - Trait seams so the worker runs against in-process doubles in tests

pub mod destination;
pub mod error;
pub mod keys;
pub mod s3;
pub mod source;

pub use destination::{DestinationClient, S3Destination};
pub use error::TransferError;
pub use keys::{date_from_key, key_for_date};
pub use s3::S3Config;
pub use source::{S3Source, SourceClient};
