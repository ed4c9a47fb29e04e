//! Long-running-operation poller: start once, refresh the handle until done.
//!
//! Providers expose asynchronous workflows (file imports, index builds) as an
//! opaque handle with a completion flag: submit, then re-fetch the handle on a
//! cadence until it reports done. Each start/poll call goes through the retry
//! envelope, so transient provider hiccups do not abort the wait.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::retry::{run_with_retry, CallError, RetryError, RetryPolicy};

/// Opaque handle returned by a start call and refreshed by polling.
///
/// Handles are cheap identifiers; cloning one per poll attempt is expected.
pub trait OperationHandle: Clone {
    /// True once the remote operation has completed.
    fn done(&self) -> bool;
}

/// Starts a long-running operation and polls it to completion.
///
/// `start` runs once through the retry loop; while the handle is not done,
/// sleeps `interval` and refreshes the handle via `poll`, each refresh
/// independently retried under the same policy. A fatal or exhausted poll
/// aborts the whole wait, not just that one refresh.
///
/// `deadline` bounds the total wait; `None` waits until completion,
/// cancellation, or a failed poll. Callers waiting on externally-determined
/// work (large imports) should still pass a generous ceiling rather than
/// `None` so an operation that never completes cannot pin the task forever.
pub async fn await_operation<H, S, SFut, P, PFut>(
    policy: &RetryPolicy,
    interval: Duration,
    deadline: Option<Duration>,
    cancel: &CancellationToken,
    mut start: S,
    mut poll: P,
) -> Result<H, RetryError>
where
    H: OperationHandle,
    S: FnMut() -> SFut,
    SFut: Future<Output = Result<H, CallError>>,
    P: FnMut(H) -> PFut,
    PFut: Future<Output = Result<H, CallError>>,
{
    let started = tokio::time::Instant::now();
    let expires = deadline.map(|d| started + d);

    let mut handle = run_with_retry(policy, cancel, &mut start).await?;

    while !handle.done() {
        let wait = match expires {
            Some(at) => {
                let now = tokio::time::Instant::now();
                if now >= at {
                    return Err(RetryError::DeadlineExceeded {
                        elapsed: started.elapsed(),
                    });
                }
                interval.min(at - now)
            }
            None => interval,
        };
        tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }
        debug!(elapsed = ?started.elapsed(), "operation not finished, refreshing handle");
        let refreshed = run_with_retry(policy, cancel, || poll(handle.clone())).await?;
        handle = refreshed;
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Clone, Debug)]
    struct ImportOp {
        done: bool,
    }

    impl OperationHandle for ImportOp {
        fn done(&self) -> bool {
            self.done
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1), 2.0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_done() {
        // Handle reads not-done twice (start + first refresh), so the loop
        // sleeps exactly twice before the refresh that reports done.
        let polls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();
        let handle = await_operation(
            &policy(),
            Duration::from_secs(5),
            None,
            &cancel,
            || async { Ok::<_, CallError>(ImportOp { done: false }) },
            |op: ImportOp| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let _ = op;
                    Ok::<_, CallError>(ImportOp { done: n >= 1 })
                }
            },
        )
        .await
        .unwrap();
        assert!(handle.done());
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn start_call_is_retried_transiently() {
        let starts = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();
        let handle = await_operation(
            &policy(),
            Duration::from_secs(5),
            None,
            &cancel,
            || {
                let n = starts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(CallError::Message("503 overloaded".to_string()))
                    } else {
                        Ok(ImportOp { done: true })
                    }
                }
            },
            |op: ImportOp| async move { Ok::<_, CallError>(op) },
        )
        .await
        .unwrap();
        assert!(handle.done());
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        // One retry backoff, no poll sleeps: the start handle was already done.
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_wait() {
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();
        let err = await_operation(
            &policy(),
            Duration::from_secs(5),
            Some(Duration::from_secs(12)),
            &cancel,
            || async { Ok::<_, CallError>(ImportOp { done: false }) },
            |op: ImportOp| async move {
                let _ = op;
                Ok::<_, CallError>(ImportOp { done: false })
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RetryError::DeadlineExceeded { .. }));
        // The last wait is clipped to the deadline: 5s + 5s + 2s.
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_poll_aborts_the_wait() {
        let cancel = CancellationToken::new();
        let err = await_operation(
            &policy(),
            Duration::from_secs(5),
            None,
            &cancel,
            || async { Ok::<_, CallError>(ImportOp { done: false }) },
            |op: ImportOp| async move {
                let _ = op;
                Err(CallError::Message("operation not found".to_string()))
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RetryError::Fatal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_poll_loop() {
        let cancel = CancellationToken::new();
        let cancel_in_start = cancel.clone();
        let err = await_operation(
            &policy(),
            Duration::from_secs(5),
            None,
            &cancel,
            move || {
                cancel_in_start.cancel();
                async { Ok::<_, CallError>(ImportOp { done: false }) }
            },
            |op: ImportOp| async move { Ok::<_, CallError>(op) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RetryError::Cancelled));
    }
}
