//! A scriptable adapter for orchestrator tests: returns a fixed batch
//! of records (or a fixed error) without touching the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use vigil_core::Record;
use vigil_sync::SyncState;

use crate::error::{AdapterError, Result};
use crate::traits::{FetchResult, SourceAdapter};

/// Mock adapter for testing without real network calls. Returns the
/// next scripted `records -> Result` pair on each call to
/// `fetch_incremental`, cycling back to the last entry once exhausted.
pub struct MockAdapter {
    name: String,
    cycles: Mutex<Vec<Result<Vec<Record>>>>,
    call_count: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cycles: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn with_cycle(self, records: Vec<Record>) -> Self {
        self.cycles.lock().unwrap().push(Ok(records));
        self
    }

    pub fn with_failure(self, error: AdapterError) -> Self {
        self.cycles.lock().unwrap().push(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_incremental(&self, _sync_state: &SyncState) -> Result<FetchResult> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let cycles = self.cycles.lock().unwrap();
        if cycles.is_empty() {
            return Ok(FetchResult {
                records: Vec::new(),
                new_watermark: Utc::now(),
            });
        }
        let slot = &cycles[idx.min(cycles.len() - 1)];
        match slot {
            Ok(records) => Ok(FetchResult {
                records: records.clone(),
                new_watermark: Utc::now(),
            }),
            Err(e) => Err(clone_error(e)),
        }
    }
}

fn clone_error(e: &AdapterError) -> AdapterError {
    match e {
        AdapterError::Transient { source, detail } => AdapterError::Transient {
            source: source.clone(),
            detail: detail.clone(),
        },
        AdapterError::Permanent { source, detail } => AdapterError::Permanent {
            source: source.clone(),
            detail: detail.clone(),
        },
        AdapterError::Timeout { source, seconds } => AdapterError::Timeout {
            source: source.clone(),
            seconds: *seconds,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_scripted_records_in_order() {
        let adapter = MockAdapter::new("nvd")
            .with_cycle(vec![Record { source: "nvd".into(), ..Default::default() }])
            .with_cycle(vec![
                Record { source: "nvd".into(), ..Default::default() },
                Record { source: "nvd".into(), ..Default::default() },
            ]);

        let state = SyncState::default();
        let first = adapter.fetch_incremental(&state).await.unwrap();
        assert_eq!(first.records.len(), 1);
        let second = adapter.fetch_incremental(&state).await.unwrap();
        assert_eq!(second.records.len(), 2);
    }

    #[tokio::test]
    async fn returns_scripted_error() {
        let adapter = MockAdapter::new("nvd").with_failure(AdapterError::Timeout {
            source: "nvd".into(),
            seconds: 30,
        });
        let state = SyncState::default();
        let result = adapter.fetch_incremental(&state).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), "timeout");
    }

    #[tokio::test]
    async fn empty_script_yields_empty_batch() {
        let adapter = MockAdapter::new("nvd");
        let state = SyncState::default();
        let result = adapter.fetch_incremental(&state).await.unwrap();
        assert!(result.records.is_empty());
    }
}
