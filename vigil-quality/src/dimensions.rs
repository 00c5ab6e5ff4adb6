//! The five independent quality dimensions (spec §4.3).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use vigil_core::{accuracy_prior, Record};
use vigil_dedup::Deduplicator;

use crate::data_type::DataTypeHint;

const FRESHNESS_DECAY_HOURS: f64 = 48.0;
const HIGH_AUTHORITY_SOURCES: &[&str] = &["nvd", "cisa_kev"];
const COMMUNITY_UNIQUENESS_BOOST: f64 = 1.2;
const TEST_DATA_TOKENS: &[&str] = &["test", "example", "demo", "sample"];

/// Arithmetic mean of `max(0, 1 - age_hours/48)` across records; records
/// with no parseable timestamp score 0.
pub fn freshness(records: &[Record], now: DateTime<Utc>) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let total: f64 = records
        .iter()
        .map(|r| match r.newest_timestamp() {
            Some(ts) => {
                let age_hours = (now - ts).num_seconds() as f64 / 3600.0;
                (1.0 - age_hours / FRESHNESS_DECAY_HOURS).max(0.0)
            }
            None => 0.0,
        })
        .sum();
    total / records.len() as f64
}

/// `cvss_score` in the spec's required-field tables is satisfied by
/// either of our strongly-typed CVSS fields.
fn field_present(record: &Record, field: &str) -> bool {
    if field == "cvss_score" {
        return record.cvss_v3_score.is_some() || record.cvss_v2_score.is_some();
    }
    record
        .attribute_view()
        .get(field)
        .map(|v| !v.is_null())
        .unwrap_or(false)
}

pub fn completeness(records: &[Record], hint: Option<DataTypeHint>) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let required = DataTypeHint::required_fields(hint);
    let total: f64 = records
        .iter()
        .map(|r| {
            let present = required.iter().filter(|f| field_present(r, f)).count();
            present as f64 / required.len() as f64
        })
        .sum();
    total / records.len() as f64
}

/// Isolated dedup pass; community sources get a generosity multiplier
/// since some redundancy there is expected.
pub fn uniqueness(source: &str, records: &[Record]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let mut dedup = Deduplicator::new();
    let out = dedup.process(records.to_vec(), &vigil_core::MergeStrategy::default());
    let raw = out.unique.len() as f64 / records.len() as f64;

    if HIGH_AUTHORITY_SOURCES.contains(&source.to_lowercase().as_str()) {
        raw
    } else {
        (raw * COMMUNITY_UNIQUENESS_BOOST).min(1.0)
    }
}

/// (a) field-presence uniformity + (b) per-field type-kind consistency,
/// averaged.
pub fn consistency(records: &[Record]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let views: Vec<BTreeMap<String, JsonValue>> = records.iter().map(|r| r.attribute_view()).collect();

    let mut all_fields: BTreeSet<String> = BTreeSet::new();
    for v in &views {
        all_fields.extend(v.keys().cloned());
    }
    if all_fields.is_empty() {
        return 0.0;
    }

    let total = views.len() as f64;
    let presence: f64 = all_fields
        .iter()
        .map(|field| {
            let count = views.iter().filter(|v| v.contains_key(field)).count();
            count as f64 / total
        })
        .sum::<f64>()
        / all_fields.len() as f64;

    let type_consistency: f64 = all_fields
        .iter()
        .map(|field| {
            let kinds: BTreeSet<&'static str> = views
                .iter()
                .filter_map(|v| v.get(field))
                .map(json_kind)
                .collect();
            1.0 / kinds.len().max(1) as f64
        })
        .sum::<f64>()
        / all_fields.len() as f64;

    (presence + type_consistency) / 2.0
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub fn accuracy(source: &str, records: &[Record]) -> f64 {
    let mut score = accuracy_prior(source);
    if records.is_empty() {
        return score;
    }

    let total = records.len() as f64;
    let test_data_count = records.iter().filter(|r| r.looks_like_test_data()).count() as f64;
    if test_data_count / total > 0.10 {
        score -= 0.10;
    }

    let missing_ids = records.iter().filter(|r| r.lacks_all_identifiers()).count() as f64;
    if missing_ids / total > 0.05 {
        score -= 0.05;
    }

    score.clamp(0.0, 1.0)
}

/// `TEST_DATA_TOKENS` is exported for reuse by record-level helpers and
/// by tests that want to assert against the same token list.
pub fn test_data_tokens() -> &'static [&'static str] {
    TEST_DATA_TOKENS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rec_with_published(hours_ago: i64) -> Record {
        Record {
            source: "nvd".into(),
            published: Some(Utc::now() - Duration::hours(hours_ago)),
            ..Default::default()
        }
    }

    #[test]
    fn freshness_decays_linearly_over_48_hours() {
        let now = Utc::now();
        let records = vec![
            Record { published: Some(now), ..Default::default() },
            Record { published: Some(now - Duration::hours(24)), ..Default::default() },
            Record { published: Some(now - Duration::hours(72)), ..Default::default() },
        ];
        let score = freshness(&records, now);
        assert!((score - 0.5).abs() < 0.05, "got {score}");
    }

    #[test]
    fn freshness_scores_zero_for_missing_timestamp() {
        let now = Utc::now();
        let records = vec![Record::default()];
        assert_eq!(freshness(&records, now), 0.0);
    }

    #[test]
    fn completeness_counts_cvss_score_alias() {
        let mut r = Record::default();
        r.cve_id = Some("CVE-2024-1".into());
        r.description = Some("desc".into());
        r.published = Some(Utc::now());
        r.cvss_v3_score = Some(9.8);
        let score = completeness(&[r], Some(DataTypeHint::Vulnerability));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn accuracy_penalizes_test_data_majority() {
        let records: Vec<Record> = (0..10)
            .map(|i| Record {
                source: "otx".into(),
                description: Some(if i < 6 { "this is a test sample".into() } else { "real finding".into() }),
                ..Default::default()
            })
            .collect();
        let score = accuracy("otx", &records);
        assert!(score < accuracy_prior("otx"));
    }

    #[test]
    fn uniqueness_boosts_non_authority_sources() {
        let records = vec![
            Record { source: "community".into(), cve_id: Some("A".into()), ..Default::default() },
            Record { source: "community".into(), cve_id: Some("B".into()), ..Default::default() },
        ];
        let score = uniqueness("community", &records);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn consistency_is_one_for_uniform_records() {
        let records: Vec<Record> = (0..3).map(|_| rec_with_published(1)).collect();
        let score = consistency(&records);
        assert!(score > 0.9, "got {score}");
    }
}
