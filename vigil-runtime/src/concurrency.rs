//! Bounded-parallelism fan-out for per-cycle fetch tasks (spec §4.5,
//! §5: "at most `max_concurrent_sources` fetch tasks may be in
//! progress simultaneously").

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinError;

/// Run every task in `tasks` to completion with at most `max_concurrent`
/// running at once. A task that panics yields `Err(JoinError)` at its
/// slot in the output rather than aborting the others — per-source
/// isolation (spec §4.5: "no per-source failure may abort another
/// source's fetch").
pub async fn run_bounded<T, F>(tasks: Vec<F>, max_concurrent: usize) -> Vec<Result<T, JoinError>>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut handles = Vec::with_capacity(tasks.len());

    for task in tasks {
        let permit = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = permit
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            task.await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_every_task_and_preserves_order() {
        let tasks: Vec<_> = (0..5)
            .map(|i| async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                i
            })
            .collect();

        let results = run_bounded(tasks, 2).await;
        let values: Vec<usize> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_bound() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        run_bounded(tasks, 3).await;
        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn one_task_panicking_does_not_abort_others() {
        let tasks: Vec<_> = (0..3)
            .map(|i| async move {
                if i == 1 {
                    panic!("boom");
                }
                i
            })
            .collect();

        let results = run_bounded(tasks, 3).await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
