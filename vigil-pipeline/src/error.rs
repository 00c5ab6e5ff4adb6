use thiserror::Error;

/// Startup failures are fatal (spec §7): the CLI exits non-zero and
/// never reaches the cycle loop. Everything else — fetch errors, sink
/// write failures, history-persist failures — is logged and counted
/// but never propagated out of `run_cycle`.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("data directory {0} is not writable: {1}")]
    DataDirUnwritable(String, #[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, StartupError>;
