//! Statistics block returned alongside a dedup pass's output sequences.

use serde::Serialize;

/// One (winner, loser) pair recorded whenever a duplicate is absorbed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeLogEntry {
    pub winner_fingerprint: String,
    pub loser_fingerprint: String,
}

/// Counters describing one [`crate::Deduplicator::dedupe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DedupStats {
    pub total_input: usize,
    pub unique_output: usize,
    pub duplicates_removed: usize,
    pub items_merged: usize,
    pub reduction_ratio: f64,
    pub approx_index_size: usize,
    pub exact_hashes_stored: usize,
}

impl DedupStats {
    pub(crate) fn compute(
        total_input: usize,
        unique_output: usize,
        items_merged: usize,
        approx_index_size: usize,
        exact_hashes_stored: usize,
    ) -> Self {
        let duplicates_removed = total_input.saturating_sub(unique_output);
        let reduction_ratio = if total_input == 0 {
            0.0
        } else {
            duplicates_removed as f64 / total_input as f64
        };
        Self {
            total_input,
            unique_output,
            duplicates_removed,
            items_merged,
            reduction_ratio,
            approx_index_size,
            exact_hashes_stored,
        }
    }
}
