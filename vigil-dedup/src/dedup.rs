//! The two-stage deduplicator (spec §4.2): an exact-match index backed
//! by a `HashMap`, gated in front by a bloom-filter-shaped approximate
//! index, followed by a best-effort fuzzy match on the `unique` set.
//!
//! A single [`Deduplicator`] is meant to live for the lifetime of the
//! orchestrator process (spec §4.5) so cross-cycle duplicates from the
//! same source are caught; call [`Deduplicator::reset`] for an isolated,
//! single-pass run (e.g. the quality analyzer's uniqueness dimension).

use std::collections::{HashMap, HashSet};

use bloomfilter::Bloom;
use chrono::Utc;

use vigil_core::{authority, fingerprint, MergeStrategy, Record};

use crate::merge::merge_into;
use crate::similarity::token_sort_ratio;
use crate::stats::{DedupStats, MergeLogEntry};

/// Design capacity of the approximate index (spec §3: "capacity ≥ 10^6").
pub const APPROX_INDEX_CAPACITY: usize = 1_000_000;
/// Design false-positive rate of the approximate index (spec §3: "≤ 0.1%").
pub const APPROX_INDEX_FP_RATE: f64 = 0.001;

/// Output of one [`Deduplicator::process`] call.
#[derive(Debug, Clone)]
pub struct DedupOutput {
    /// Records from this call's input that were not duplicates of
    /// anything seen so far (this call or earlier ones).
    pub unique: Vec<Record>,
    /// Records from this call's input identified as duplicates.
    pub duplicates: Vec<Record>,
    /// The subset of retained records (from this call or earlier ones)
    /// that absorbed at least one duplicate during this call.
    pub merged: Vec<Record>,
    pub stats: DedupStats,
}

pub struct Deduplicator {
    exact_index: HashMap<String, usize>,
    approx_index: Bloom<String>,
    unique: Vec<Record>,
    merge_log: Vec<MergeLogEntry>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            exact_index: HashMap::new(),
            approx_index: Bloom::new_for_fp_rate(APPROX_INDEX_CAPACITY, APPROX_INDEX_FP_RATE),
            unique: Vec::new(),
            merge_log: Vec::new(),
        }
    }

    /// Drop all accumulated state. The next `process` call behaves as
    /// though against a brand-new deduplicator.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn merge_log(&self) -> &[MergeLogEntry] {
        &self.merge_log
    }

    /// Cumulative count of distinct records retained across every call
    /// since construction or the last `reset` (spec §8 scenario 6).
    pub fn retained_len(&self) -> usize {
        self.unique.len()
    }

    /// Run one batch of records through the deduplicator.
    pub fn process(&mut self, input: Vec<Record>, strategy: &MergeStrategy) -> DedupOutput {
        let total_input = input.len();

        let mut ordered = input;
        if strategy.keep_highest_authority {
            // `sort_by_key` with a descending key is a stable sort: ties
            // (equal authority) keep their original relative order.
            ordered.sort_by(|a, b| authority(b).cmp(&authority(a)));
        }

        let mut duplicates = Vec::new();
        let mut new_indices: Vec<usize> = Vec::new();
        let mut merged_indices: HashSet<usize> = HashSet::new();

        for record in ordered {
            let fp = fingerprint(&record);

            if let Some(&idx) = self.exact_index.get(&fp) {
                self.absorb(idx, &record, &fp, strategy, &mut merged_indices);
                duplicates.push(record);
                continue;
            }

            if self.approx_index.check(&fp) {
                if let Some(idx) = self.find_fuzzy_match(&record, strategy) {
                    self.absorb(idx, &record, &fp, strategy, &mut merged_indices);
                    duplicates.push(record);
                    continue;
                }
                tracing::trace!(fingerprint = %fp, "approximate index hit but no fuzzy match, treating as unique");
            }

            self.approx_index.set(&fp);
            let idx = self.unique.len();
            self.exact_index.insert(fp, idx);
            self.unique.push(record);
            new_indices.push(idx);
        }

        let unique: Vec<Record> = new_indices.iter().map(|&i| self.unique[i].clone()).collect();
        let merged: Vec<Record> = merged_indices.iter().map(|&i| self.unique[i].clone()).collect();

        let stats = DedupStats::compute(
            total_input,
            unique.len(),
            merged.len(),
            APPROX_INDEX_CAPACITY,
            self.exact_index.len(),
        );

        DedupOutput {
            unique,
            duplicates,
            merged,
            stats,
        }
    }

    fn absorb(
        &mut self,
        winner_idx: usize,
        loser: &Record,
        loser_fp: &str,
        strategy: &MergeStrategy,
        merged_indices: &mut HashSet<usize>,
    ) {
        let winner_fp = fingerprint(&self.unique[winner_idx]);
        if strategy.merge_fields {
            merge_into(&mut self.unique[winner_idx], loser, strategy, Utc::now());
            merged_indices.insert(winner_idx);
        }
        self.merge_log.push(MergeLogEntry {
            winner_fingerprint: winner_fp,
            loser_fingerprint: loser_fp.to_string(),
        });
    }

    /// Best-effort near-duplicate search against the current `unique`
    /// set. Only reached after the bloom filter reports a possible
    /// match, so for genuinely new descriptions this path is rarely
    /// taken — the spec preserves this best-effort semantics rather
    /// than broadening the gate (design notes, open question #1).
    fn find_fuzzy_match(&self, record: &Record, strategy: &MergeStrategy) -> Option<usize> {
        if let Some(cve) = record.cve_id.as_deref().filter(|s| !s.is_empty()) {
            return self
                .unique
                .iter()
                .position(|r| r.cve_id.as_deref() == Some(cve));
        }

        let desc = record.description.as_deref().filter(|s| !s.is_empty())?;
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in self.unique.iter().enumerate() {
            let Some(cdesc) = candidate.description.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            let score = token_sort_ratio(desc, cdesc);
            if score >= strategy.similarity_threshold
                && best.map(|(_, b)| score > b).unwrap_or(true)
            {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| idx)
    }
}
