//! Merge-strategy configuration recognized by the deduplicator.

use serde::{Deserialize, Serialize};

/// Controls how the deduplicator treats duplicates it finds (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeStrategy {
    /// Fold complementary attributes from a duplicate into the retained
    /// record instead of just discarding it.
    pub merge_fields: bool,
    /// Stable-sort the input by authority (descending) before scanning,
    /// so the first-seen record at each fingerprint is the
    /// highest-authority one.
    pub keep_highest_authority: bool,
    /// Merged numeric score attributes take `max(winner, loser)`
    /// instead of keeping the winner's value untouched.
    pub aggregate_scores: bool,
    /// Merged records carry a `sources` list unioning every contributing
    /// source tag.
    pub preserve_all_sources: bool,
    /// Token-sort similarity threshold (0.0-1.0) above which two
    /// descriptions are treated as a near-duplicate on the fuzzy path.
    pub similarity_threshold: f64,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self {
            merge_fields: true,
            keep_highest_authority: true,
            aggregate_scores: true,
            preserve_all_sources: true,
            similarity_threshold: 0.85,
        }
    }
}
