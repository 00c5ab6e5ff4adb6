//! Async runtime abstraction for the ingestion orchestrator.
//!
//! [`PipelineRuntime`] exists so the orchestrator's cycle loop can be
//! driven deterministically in tests (via [`MockRuntime`]) without
//! depending on wall-clock sleeps or a live Tokio reactor, while
//! production code uses [`TokioRuntime`]. Task spawning has no
//! deterministic variant worth abstracting over — both runtimes hand
//! off to the same Tokio executor — so it stays a bare `tokio::spawn`
//! at the call sites ([`run_bounded`]) rather than living on this trait.

pub mod concurrency;
pub mod shutdown;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use concurrency::run_bounded;
pub use shutdown::ShutdownSignal;

/// Runtime trait for the orchestrator's suspension points: wall-clock
/// reads and interval sleeps (spec §5: "only I/O operations suspend").
pub trait PipelineRuntime: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRuntime;

impl TokioRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineRuntime for TokioRuntime {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic runtime for orchestrator tests: `sleep` resolves
/// immediately and `now` is driven by an explicit clock the test
/// controls, so "run two cycles with no time advance" scenarios (spec
/// §8) don't race real wall-clock timestamps.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Debug)]
    pub struct MockRuntime {
        millis_since_epoch: AtomicI64,
    }

    impl MockRuntime {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis_since_epoch: AtomicI64::new(start.timestamp_millis()),
            }
        }

        pub fn advance(&self, duration: Duration) {
            self.millis_since_epoch
                .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        }
    }

    impl PipelineRuntime for MockRuntime {
        fn now(&self) -> DateTime<Utc> {
            let millis = self.millis_since_epoch.load(Ordering::SeqCst);
            DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
        }

        async fn sleep(&self, _duration: Duration) {}
    }
}

pub use mock::MockRuntime;
