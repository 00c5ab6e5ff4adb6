//! Deterministic identity fingerprint for a [`Record`].
//!
//! Grounded on the `PeerId::from_public_key` pattern in the teacher
//! crate (hash an identifying byte string with SHA-256, hex-encode the
//! digest) — here the identifying string is the record's primary
//! identifier rather than a public key.

use sha2::{Digest, Sha256};

use crate::record::Record;

/// Primary identifiers, tried in priority order. Source is deliberately
/// excluded: two records with the same primary identifier but different
/// sources must fingerprint identically so cross-source merging works.
fn primary_identifier(record: &Record) -> Option<(&'static str, &str)> {
    if let Some(v) = non_empty(&record.cve_id) {
        return Some(("cve_id", v));
    }
    if let Some(v) = non_empty(&record.indicator) {
        return Some(("indicator", v));
    }
    if let Some(v) = non_empty(&record.pulse_id) {
        return Some(("pulse_id", v));
    }
    if let Some(v) = non_empty(&record.sha256) {
        return Some(("sha256", v));
    }
    if let Some(v) = non_empty(&record.md5) {
        return Some(("md5", v));
    }
    None
}

fn non_empty(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().filter(|s| !s.is_empty())
}

/// Secondary fingerprint material, tried when no primary identifier is
/// present: a 32-bit hash of the lowercased first 200 chars of
/// `description`, then the lowercased `title`/`name`.
fn secondary_identifier(record: &Record) -> Option<String> {
    if let Some(desc) = non_empty(&record.description) {
        let lower = desc.to_lowercase();
        let truncated: String = lower.chars().take(200).collect();
        return Some(format!("desc32:{:08x}", fnv1a32(truncated.as_bytes())));
    }
    if let Some(v) = non_empty(&record.title).or_else(|| non_empty(&record.name)) {
        return Some(format!("name:{}", v.to_lowercase()));
    }
    None
}

/// Last-resort fallback: hash the canonicalized full record. Built from
/// the record's own `attribute_view`, which already sorts by key, so two
/// structurally identical records (down to field order) hash the same.
fn canonical_fallback(record: &Record) -> String {
    let view = record.attribute_view();
    let mut segments: Vec<String> = view
        .iter()
        .filter(|(k, _)| k.as_str() != "source")
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    segments.sort();
    format!("full:{:08x}", fnv1a32(segments.join("|").as_bytes()))
}

/// FNV-1a, 32-bit: the "non-cryptographic hash" the spec calls for to
/// seed the secondary/fallback identifiers before they are folded into
/// the final SHA-256 digest.
fn fnv1a32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes.iter().fold(OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u32).wrapping_mul(PRIME)
    })
}

/// Deterministic, pure identity digest for a record: a 256-bit (64
/// hex-character) string derived from the first available identifier
/// in the priority order fixed by spec §3.
pub fn fingerprint(record: &Record) -> String {
    let selected = match primary_identifier(record) {
        Some((kind, value)) => format!("{kind}:{value}"),
        None => match secondary_identifier(record) {
            Some(s) => s,
            None => canonical_fallback(record),
        },
    };

    let mut hasher = Sha256::new();
    hasher.update(selected.as_bytes());
    let digest = hasher.finalize();
    hex_lower(&digest)
}

fn hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
