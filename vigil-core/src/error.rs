//! Error type for `vigil-core`.

/// Errors raised by record-model operations.
///
/// Fingerprinting itself never fails (spec: deterministic, pure, total);
/// this type exists for the handful of operations — canonicalization of
/// a record into a stable attribute view — that touch `serde_json` and
/// can in principle reject a non-finite float.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to canonicalize record: {0}")]
    Canonicalization(String),
}
