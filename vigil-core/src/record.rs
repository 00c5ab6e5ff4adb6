//! The canonical [`Record`] shape: a small set of strongly-typed
//! "well-known" fields plus an overflow map for arbitrary attributes.
//!
//! The dedup merge rules (see `vigil-dedup`) enumerate exactly which
//! well-known fields participate in a merge; everything else rides in
//! `extra` and survives a merge by simple presence-copy.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Audit trail left on a record that absorbed a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicationAudit {
    pub merged: bool,
    pub merge_time: DateTime<Utc>,
    pub primary_source: String,
    pub secondary_source: String,
}

/// A single ingested item: a vulnerability, indicator, pulse, or sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub source: String,

    // Primary identifiers, tried in this priority order for fingerprinting.
    pub cve_id: Option<String>,
    pub indicator: Option<String>,
    pub pulse_id: Option<String>,
    pub sha256: Option<String>,
    pub md5: Option<String>,

    // Secondary-fingerprint material.
    pub description: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,

    // Completeness-dimension fields not already covered above.
    pub id: Option<String>,
    pub hash: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,

    // List attributes eligible for union-merge.
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cwe_ids: Vec<String>,
    #[serde(default)]
    pub attack_techniques: Vec<String>,

    // Score attributes eligible for max-merge.
    pub cvss_v3_score: Option<f64>,
    pub cvss_v2_score: Option<f64>,
    pub epss_score: Option<f64>,

    // Candidate age/freshness fields, in preference order.
    pub published: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub timestamp: Option<DateTime<Utc>>,
    pub first_seen: Option<DateTime<Utc>>,

    /// Populated when `preserve_all_sources` merges two records.
    pub sources: Option<Vec<String>>,
    /// Populated once this record has absorbed at least one duplicate.
    pub deduplication: Option<DeduplicationAudit>,

    /// Arbitrary attributes outside the well-known set.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl Record {
    /// Newest of the candidate timestamp fields, in the priority order
    /// fixed by spec §3: `published`, `last_modified`, `modified`,
    /// `updated`, `created`, `timestamp`.
    pub fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.published
            .or(self.last_modified)
            .or(self.modified)
            .or(self.updated)
            .or(self.created)
            .or(self.timestamp)
    }

    /// A flattened `attribute -> value` view of the whole record,
    /// well-known fields and overflow combined, used by the quality
    /// analyzer's completeness/consistency dimensions which need to
    /// enumerate "every attribute appearing anywhere" generically.
    ///
    /// Absent (`None`) and empty-list well-known fields are omitted so
    /// "present and non-empty" checks don't need field-specific logic.
    pub fn attribute_view(&self) -> BTreeMap<String, JsonValue> {
        let mut out = match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map.into_iter().collect::<BTreeMap<_, _>>(),
            _ => BTreeMap::new(),
        };
        out.retain(|_, v| !is_empty_value(v));
        out
    }

    /// True if `description` contains a test/demo token, per the
    /// accuracy-dimension test-data heuristic (spec §4.3).
    pub fn looks_like_test_data(&self) -> bool {
        match &self.description {
            Some(d) => {
                let lower = d.to_lowercase();
                ["test", "example", "demo", "sample"]
                    .iter()
                    .any(|tok| lower.contains(tok))
            }
            None => false,
        }
    }

    /// True if none of the three "has any identifier" fields are set.
    pub fn lacks_all_identifiers(&self) -> bool {
        self.id.is_none() && self.cve_id.is_none() && self.indicator.is_none()
    }
}

fn is_empty_value(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        _ => false,
    }
}
