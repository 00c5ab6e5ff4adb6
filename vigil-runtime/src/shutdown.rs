//! Cooperative shutdown signal (spec §4.5, §5): `stop()` requests a
//! shutdown; in-progress work is joined rather than aborted, and the
//! between-cycle sleep is cancellable.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::PipelineRuntime;

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    requested: std::sync::atomic::AtomicBool,
    notify: Notify,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                requested: std::sync::atomic::AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn request(&self) {
        self.inner
            .requested
            .store(true, std::sync::atomic::Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Resolves either when `duration` elapses (measured by `runtime`,
    /// so `MockRuntime` drives this instantly in tests) or `request()`
    /// is called, whichever comes first. Returns `true` if shutdown was
    /// requested during the wait.
    pub async fn wait_or<R: PipelineRuntime>(&self, runtime: &R, duration: std::time::Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        tokio::select! {
            _ = runtime.sleep(duration) => self.is_requested(),
            _ = self.inner.notify.notified() => true,
        }
    }
}
