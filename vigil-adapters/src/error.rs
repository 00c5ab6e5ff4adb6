use thiserror::Error;

/// Any raised condition from an adapter is treated uniformly by the
/// orchestrator as "no records, error counted" (spec §6) — the kind
/// only affects what gets logged and counted.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transient fetch error from {source}: {detail}")]
    Transient { source: String, detail: String },

    #[error("permanent fetch error from {source}: {detail}")]
    Permanent { source: String, detail: String },

    #[error("timeout fetching from {source} after {seconds}s")]
    Timeout { source: String, seconds: u64 },
}

impl AdapterError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Transient { .. } => "transient",
            AdapterError::Permanent { .. } => "permanent",
            AdapterError::Timeout { .. } => "timeout",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
