//! Two-stage duplicate detection and merge engine for the Vigil
//! threat-intelligence ingestion pipeline.
//!
//! [`dedup::Deduplicator`] is the entry point; [`merge::merge_into`] and
//! [`similarity::token_sort_ratio`] are exposed separately because the
//! quality analyzer reuses the similarity metric for its uniqueness
//! dimension.

pub mod dedup;
pub mod merge;
pub mod similarity;
pub mod stats;

pub use dedup::{DedupOutput, Deduplicator};
pub use stats::{DedupStats, MergeLogEntry};
