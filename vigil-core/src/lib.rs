//! Record model, fingerprinting, and source authority for the Vigil
//! threat-intelligence ingestion pipeline.
//!
//! This crate has no async and no I/O: it is the pure domain kernel that
//! [`vigil-dedup`] and [`vigil-quality`] build on.

pub mod authority;
pub mod error;
pub mod fingerprint;
pub mod merge_strategy;
pub mod record;

pub use authority::{accuracy_prior, authority};
pub use error::Error;
pub use fingerprint::fingerprint;
pub use merge_strategy::MergeStrategy;
pub use record::{DeduplicationAudit, Record};

/// Result type for `vigil-core` operations.
pub type Result<T> = std::result::Result<T, Error>;
