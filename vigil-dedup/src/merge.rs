//! Merge rules applied to a winner/loser pair (spec §4.2).

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use vigil_core::{DeduplicationAudit, MergeStrategy, Record};

/// Fold `loser` into `winner` in place, per the merge rules.
pub fn merge_into(winner: &mut Record, loser: &Record, strategy: &MergeStrategy, now: DateTime<Utc>) {
    union_list(&mut winner.references, &loser.references);
    union_list(&mut winner.tags, &loser.tags);
    union_list(&mut winner.cwe_ids, &loser.cwe_ids);
    union_list(&mut winner.attack_techniques, &loser.attack_techniques);

    merge_score(&mut winner.cvss_v3_score, loser.cvss_v3_score, strategy.aggregate_scores);
    merge_score(&mut winner.cvss_v2_score, loser.cvss_v2_score, strategy.aggregate_scores);
    merge_score(&mut winner.epss_score, loser.epss_score, strategy.aggregate_scores);

    copy_if_absent(&mut winner.cve_id, &loser.cve_id);
    copy_if_absent(&mut winner.indicator, &loser.indicator);
    copy_if_absent(&mut winner.pulse_id, &loser.pulse_id);
    copy_if_absent(&mut winner.sha256, &loser.sha256);
    copy_if_absent(&mut winner.md5, &loser.md5);
    copy_if_absent(&mut winner.description, &loser.description);
    copy_if_absent(&mut winner.title, &loser.title);
    copy_if_absent(&mut winner.name, &loser.name);
    copy_if_absent(&mut winner.id, &loser.id);
    copy_if_absent(&mut winner.hash, &loser.hash);
    copy_if_absent(&mut winner.kind, &loser.kind);
    copy_if_absent_t(&mut winner.published, loser.published);
    copy_if_absent_t(&mut winner.last_modified, loser.last_modified);
    copy_if_absent_t(&mut winner.modified, loser.modified);
    copy_if_absent_t(&mut winner.updated, loser.updated);
    copy_if_absent_t(&mut winner.created, loser.created);
    copy_if_absent_t(&mut winner.timestamp, loser.timestamp);
    copy_if_absent_t(&mut winner.first_seen, loser.first_seen);

    for (k, v) in loser.extra.iter() {
        winner.extra.entry(k.clone()).or_insert_with(|| v.clone());
    }

    if strategy.preserve_all_sources {
        let mut set: BTreeSet<String> = winner
            .sources
            .clone()
            .unwrap_or_else(|| vec![winner.source.clone()])
            .into_iter()
            .collect();
        set.insert(loser.source.clone());
        winner.sources = Some(set.into_iter().collect());
    }

    winner.deduplication = Some(DeduplicationAudit {
        merged: true,
        merge_time: now,
        primary_source: winner.source.clone(),
        secondary_source: loser.source.clone(),
    });
}

fn union_list(winner: &mut Vec<String>, loser: &[String]) {
    for item in loser {
        if !winner.contains(item) {
            winner.push(item.clone());
        }
    }
}

fn merge_score(winner: &mut Option<f64>, loser: Option<f64>, aggregate: bool) {
    match (*winner, loser) {
        (Some(w), Some(l)) if aggregate => *winner = Some(w.max(l)),
        (None, Some(l)) => *winner = Some(l),
        _ => {}
    }
}

fn copy_if_absent(winner: &mut Option<String>, loser: &Option<String>) {
    if winner.as_ref().map(|s| s.is_empty()).unwrap_or(true) {
        if let Some(v) = loser {
            if !v.is_empty() {
                *winner = Some(v.clone());
            }
        }
    }
}

fn copy_if_absent_t<T: Copy>(winner: &mut Option<T>, loser: Option<T>) {
    if winner.is_none() {
        *winner = loser;
    }
}
