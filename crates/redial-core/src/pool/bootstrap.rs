//! Generic init-retry core: attempt, sleep, double the delay, attempt again.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Bootstrap failure after the whole retry budget is spent.
#[derive(Debug, Error)]
#[error("pool initialization failed after {attempts} attempts: {source}")]
pub struct PoolInitError {
    pub attempts: u32,
    #[source]
    pub source: anyhow::Error,
}

/// Runs `attempt_fn` up to `retries` times with a doubling backoff between
/// failures (no sleep after the final one).
///
/// Every failure is retried here, DNS and connect alike; the transient/fatal
/// split of the call envelope does not apply to bootstrap.
pub async fn init_with_retry<T, F, Fut>(
    retries: u32,
    initial_backoff: Duration,
    mut attempt_fn: F,
) -> Result<T, PoolInitError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let retries = retries.max(1);
    let mut backoff = initial_backoff;
    let mut last_err = None;
    for attempt in 1..=retries {
        match attempt_fn(attempt).await {
            Ok(value) => {
                info!(attempt, "pool initialized");
                return Ok(value);
            }
            Err(e) => {
                warn!(attempt, retries, error = %e, "pool init attempt failed");
                last_err = Some(e);
                if attempt < retries {
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }
    Err(PoolInitError {
        attempts: retries,
        source: last_err.unwrap_or_else(|| anyhow::anyhow!("no attempt was made")),
    })
}

/// Once-only wrapper around [`init_with_retry`].
///
/// At most one initialization runs at a time; concurrent callers wait for it
/// and share the result. After the first success, later calls return the
/// existing value without attempting any connection. A failed initialization
/// is not cached, so the next call starts a fresh retry run.
pub(crate) struct InitOnce<T> {
    cell: OnceCell<T>,
}

impl<T> InitOnce<T> {
    pub(crate) fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub(crate) async fn get_or_init_with_retry<F, Fut>(
        &self,
        retries: u32,
        initial_backoff: Duration,
        attempt_fn: F,
    ) -> Result<&T, PoolInitError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.cell
            .get_or_try_init(|| init_with_retry(retries, initial_backoff, attempt_fn))
            .await
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn doubles_backoff_until_budget_is_spent() {
        // retries=3, backoff 1s: sleeps 1s then 2s between the three
        // attempts, none after the last.
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let err = init_with_retry::<(), _, _>(3, Duration::from_secs(1), |_attempt| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("name resolution failed")) }
        })
        .await
        .unwrap_err();
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_success() {
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let value = init_with_retry(3, Duration::from_secs(1), |_attempt| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(anyhow::anyhow!("connection refused"))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn init_once_makes_no_further_attempts_after_success() {
        let once = InitOnce::new();
        let attempts = AtomicU32::new(0);

        let first = once
            .get_or_init_with_retry(3, Duration::from_secs(1), |_attempt| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, anyhow::Error>(42u32) }
            })
            .await
            .unwrap();
        assert_eq!(*first, 42);

        let second = once
            .get_or_init_with_retry(3, Duration::from_secs(1), |_attempt| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, anyhow::Error>(7u32) }
            })
            .await
            .unwrap();
        assert_eq!(*second, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_init_is_not_cached() {
        let once = InitOnce::new();
        let attempts = AtomicU32::new(0);

        let err = once
            .get_or_init_with_retry(2, Duration::from_secs(1), |_attempt| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(anyhow::anyhow!("still starting")) }
            })
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 2);
        assert!(once.get().is_none());

        let value = once
            .get_or_init_with_retry(2, Duration::from_secs(1), |_attempt| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, anyhow::Error>(9u32) }
            })
            .await
            .unwrap();
        assert_eq!(*value, 9);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
