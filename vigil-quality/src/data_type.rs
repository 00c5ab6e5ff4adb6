//! Data-type hints drive which fields the completeness dimension expects.

/// Optional hint about what kind of records are being analyzed.
///
/// Mirrors the `DataTypeHint` passed by callers of the original scoring
/// routine; absent a hint, the analyzer falls back to a generic
/// required-field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTypeHint {
    Vulnerability,
    ThreatIntelligence,
    Malware,
}

impl DataTypeHint {
    /// Required, non-empty fields for the completeness dimension (spec §4.3).
    pub fn required_fields(hint: Option<DataTypeHint>) -> &'static [&'static str] {
        match hint {
            Some(DataTypeHint::Vulnerability) => {
                &["cve_id", "description", "published", "cvss_score"]
            }
            Some(DataTypeHint::ThreatIntelligence) => &["indicator", "type", "source", "timestamp"],
            Some(DataTypeHint::Malware) => &["hash", "name", "type", "first_seen"],
            None => &["id", "source", "timestamp"],
        }
    }
}
