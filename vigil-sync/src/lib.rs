//! Durable per-source incremental-sync watermarks (spec §4.4).
//!
//! One JSON file per source holds `{last_sync, total_processed}`.
//! `last_sync` is the end of the window the *previous* cycle queried,
//! not the instant that cycle finished — see
//! [`crate::Orchestrator::run_cycle`] in `vigil-pipeline`, which only
//! advances the watermark after sinks have committed (spec §9, open
//! question 2).

pub mod error;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

/// First-run adapters fetch this far back when `last_sync` is absent.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub last_sync: Option<DateTime<Utc>>,
    pub total_processed: u64,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_sync: None,
            total_processed: 0,
        }
    }
}

impl SyncState {
    /// The instant an adapter should fetch from: `last_sync` if set,
    /// else 30 days before `now`.
    pub fn fetch_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_sync
            .unwrap_or_else(|| now - Duration::days(DEFAULT_LOOKBACK_DAYS))
    }

    pub fn advance(&self, new_watermark: DateTime<Utc>, items_processed: u64) -> Self {
        Self {
            last_sync: Some(new_watermark),
            total_processed: self.total_processed + items_processed,
        }
    }

    pub fn load(data_dir: &Path, source: &str) -> Result<Self> {
        let path = state_path(data_dir, source);
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, data_dir: &Path, source: &str) -> Result<()> {
        let path = state_path(data_dir, source);
        atomic_write(&path, &serde_json::to_vec_pretty(self)?)
    }
}

fn state_path(data_dir: &Path, source: &str) -> PathBuf {
    data_dir.join(format!("{source}_sync_state.json"))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Write {
            path: path.display().to_string(),
            source,
        })?;
    }

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("sync_state.json");
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let write = |tmp: &Path| -> std::io::Result<()> {
        let mut f = fs::File::create(tmp)?;
        f.write_all(bytes)?;
        f.flush()?;
        let _ = f.sync_all();
        Ok(())
    };
    write(&tmp_path).map_err(|source| Error::Write {
        path: path.display().to_string(),
        source,
    })?;

    fs::rename(&tmp_path, path).map_err(|source| Error::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_has_no_watermark_and_fetches_30_days_back() {
        let state = SyncState::default();
        let now = Utc::now();
        let from = state.fetch_from(now);
        assert!(now - from >= Duration::days(DEFAULT_LOOKBACK_DAYS) - Duration::seconds(1));
    }

    #[test]
    fn advance_is_monotonic_in_total_processed() {
        let state = SyncState::default();
        let next = state.advance(Utc::now(), 42);
        assert_eq!(next.total_processed, 42);
        let next2 = next.advance(Utc::now(), 8);
        assert_eq!(next2.total_processed, 50);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = SyncState::default().advance(Utc::now(), 10);
        state.save(dir.path(), "nvd").unwrap();

        let loaded = SyncState::load(dir.path(), "nvd").unwrap();
        assert_eq!(loaded.total_processed, 10);
        assert!(loaded.last_sync.is_some());
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SyncState::load(dir.path(), "never_synced").unwrap();
        assert_eq!(loaded, SyncState::default());
    }
}
