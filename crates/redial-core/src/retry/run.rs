//! Retry loop: run a remote call until success, fatal error, exhaustion, or
//! cancellation.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::classify::classify;
use super::error::{CallError, RetryError};
use super::policy::RetryPolicy;

/// Runs an async remote call under the given policy.
///
/// Attempts are strictly sequential; attempt N+1 never starts before attempt
/// N's outcome is known. The backoff sleep is async, so other tasks on the
/// runtime keep making progress during a multi-second wait, and the
/// cancellation token is honored during every sleep.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let mut attempt = 1u32;
    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let class = classify(&e);
                if !class.is_transient {
                    error!(attempt, error = %class.message, "remote call failed, not retryable");
                    return Err(RetryError::Fatal(e));
                }
                if attempt >= policy.max_attempts() {
                    error!(
                        attempts = attempt,
                        error = %class.message,
                        "remote call still failing transiently, retry budget spent"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
                let delay = policy.backoff_for(attempt);
                warn!(attempt, delay = ?delay, error = %class.message, "transient remote-call failure, backing off");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

/// Variant for blocking calls (e.g. a synchronous provider SDK): each attempt
/// runs on a `spawn_blocking` worker so the caller's event loop is not starved
/// by network I/O.
pub async fn run_blocking_with_retry<T, F>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    call: F,
) -> Result<T, RetryError>
where
    F: Fn() -> Result<T, CallError> + Clone + Send + 'static,
    T: Send + 'static,
{
    run_with_retry(policy, cancel, move || {
        let call = call.clone();
        async move {
            tokio::task::spawn_blocking(call)
                .await
                .map_err(|join| CallError::Other(anyhow::anyhow!("blocking call panicked: {join}")))?
        }
    })
    .await
}
