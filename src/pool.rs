// src/pool.rs

//! Bounded concurrent task execution
//!
//! Runs a set of keyed futures with at most `max_parallel` in flight on the
//! calling task. Either every task succeeds and all results are returned, or
//! the first failure is returned and the remaining in-flight work is dropped.

use crate::error::Result;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::debug;

/// Run keyed tasks with bounded parallelism, all or nothing
///
/// A `max_parallel` of zero means no bound: every task is started at once.
pub async fn run_concurrent<K, V, F>(tasks: Vec<(K, F)>, max_parallel: usize) -> Result<BTreeMap<K, V>>
where
    K: Ord,
    F: Future<Output = Result<V>>,
{
    let total = tasks.len();
    let limit = if max_parallel == 0 {
        total.max(1)
    } else {
        max_parallel
    };
    debug!("Running {} tasks, at most {} in flight", total, limit);

    let mut pending = stream::iter(
        tasks
            .into_iter()
            .map(|(key, task)| async move { (key, task.await) }),
    )
    .buffer_unordered(limit);

    let mut results = BTreeMap::new();
    while let Some((key, result)) = pending.next().await {
        results.insert(key, result?);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_results_collected() {
        let tasks: Vec<_> = (0..10)
            .map(|i| (i, async move { Ok::<_, Error>(i * 2) }))
            .collect();

        let results = run_concurrent(tasks, 3).await.unwrap();
        assert_eq!(results.len(), 10);
        assert_eq!(results[&7], 14);
    }

    #[tokio::test]
    async fn test_parallelism_is_bounded() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let in_flight = &in_flight;
                let peak = &peak;
                let task = async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Error>(i)
                };
                (i, task)
            })
            .collect();

        run_concurrent(tasks, 4).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_unbounded_starts_everything() {
        let peak = AtomicUsize::new(0);
        let in_flight = AtomicUsize::new(0);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let in_flight = &in_flight;
                let peak = &peak;
                let task = async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok::<_, Error>(())
                };
                (i, task)
            })
            .collect();

        run_concurrent(tasks, 0).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_first_error_fails_batch() {
        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let task = async move {
                    if i == 3 {
                        Err(Error::Network("connection refused".to_string()))
                    } else {
                        Ok(i)
                    }
                };
                (i, task)
            })
            .collect();

        let result = run_concurrent(tasks, 2).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let tasks: Vec<(u32, std::future::Ready<Result<u32>>)> = Vec::new();
        let results = run_concurrent(tasks, 64).await.unwrap();
        assert!(results.is_empty());
    }
}
