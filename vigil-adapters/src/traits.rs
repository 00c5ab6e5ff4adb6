//! The adapter contract (spec §6): the only interface the core
//! requires of every source producer.

use chrono::{DateTime, Utc};
use vigil_core::Record;
use vigil_sync::SyncState;

use crate::error::Result;

/// Per-request timeout the orchestrator expects every adapter to
/// enforce on its own HTTP calls (spec §5). Exceeding it is an
/// `AdapterError::Timeout`, handled like any other task error.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Source-specific rate-limit hint an adapter may honor between
/// requests (spec §5's NVD example: 6s without an API key, 1s with
/// one). The core does not enforce this; it's informational plumbing
/// for adapters that want a shared shape instead of hand-rolled sleeps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitHint {
    pub min_interval_secs_no_key: u64,
    pub min_interval_secs_with_key: u64,
}

impl RateLimitHint {
    pub const NVD: Self = Self {
        min_interval_secs_no_key: 6,
        min_interval_secs_with_key: 1,
    };

    pub fn min_interval_secs(&self, has_api_key: bool) -> u64 {
        if has_api_key {
            self.min_interval_secs_with_key
        } else {
            self.min_interval_secs_no_key
        }
    }
}

/// A finite batch of raw records plus the watermark the orchestrator
/// should persist once sinks for this cycle have committed.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub records: Vec<Record>,
    pub new_watermark: DateTime<Utc>,
}

/// Implemented by every external source producer. The core only calls
/// `fetch_incremental` once per cycle per enabled source; adapters own
/// their transient network state (spec §3).
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable lowercase tag used for authority lookup, metrics labels,
    /// and sink file naming.
    fn name(&self) -> &str;

    /// Fetch records changed since `sync_state.last_sync`, returning
    /// them alongside the watermark that should become the new
    /// `last_sync` once this cycle's sinks have committed.
    async fn fetch_incremental(&self, sync_state: &SyncState) -> Result<FetchResult>;
}
