//! Static source-authority and per-source accuracy-prior tables.
//!
//! Both tables are fixed configuration (spec §3, §4.3): changing them
//! requires a rebuild, so they are plain `match` arms rather than data
//! loaded at runtime.

use crate::record::Record;

/// Authority of `source` in `[1, 10]`. Unknown or absent sources get 1.
pub fn authority_for_source(source: &str) -> u8 {
    match source.to_lowercase().as_str() {
        "cisa_kev" | "cisa-kev" => 10,
        "nvd" => 9,
        "mitre_attack" | "mitre-attack" | "attack" => 9,
        "mitre_d3fend" | "mitre-d3fend" | "d3fend" => 8,
        "epss" => 8,
        "otx" => 7,
        "abuse.ch" | "abuse_ch" | "abusech" => 6,
        "community" => 5,
        _ => 1,
    }
}

/// Authority of a record: looks up `lower(record.source)`.
pub fn authority(record: &Record) -> u8 {
    authority_for_source(&record.source)
}

/// Per-source accuracy prior used as the starting point for the
/// accuracy dimension (spec §4.3), before the test-data and
/// missing-identifier penalties are applied.
pub fn accuracy_prior(source: &str) -> f64 {
    match source.to_lowercase().as_str() {
        "nvd" => 0.98,
        "cisa_kev" | "cisa-kev" => 0.99,
        "mitre_attack" | "mitre-attack" | "attack" => 0.95,
        "epss" => 0.90,
        "otx" => 0.85,
        "abuse.ch" | "abuse_ch" | "abusech" => 0.88,
        _ => 0.80,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_defaults_to_one() {
        assert_eq!(authority_for_source("some_random_feed"), 1);
    }

    #[test]
    fn cisa_kev_outranks_nvd() {
        assert!(authority_for_source("cisa_kev") > authority_for_source("nvd"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(authority_for_source("NVD"), authority_for_source("nvd"));
    }
}
