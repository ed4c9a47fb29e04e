//! Error shapes for remote calls and the retry loop.

use std::time::Duration;
use thiserror::Error;

/// Normalized error surfaced by one remote-call attempt.
///
/// Integrations map their provider-specific failures into this shape before
/// the classifier sees them, so classification never probes foreign types.
#[derive(Debug, Error)]
pub enum CallError {
    /// The provider reported an HTTP-style status code.
    #[error("{message} (HTTP {code})")]
    Status { code: u16, message: String },
    /// Only failure text is available.
    #[error("{0}")]
    Message(String),
    /// Opaque upstream error; classified from its display text alone.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CallError {
    /// Status code reported by the provider, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CallError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Failure of a whole retry run (simple call or long-running operation).
#[derive(Debug, Error)]
pub enum RetryError {
    /// Non-retryable failure, propagated on first occurrence. Displays as the
    /// underlying error so callers see the original message.
    #[error(transparent)]
    Fatal(CallError),
    /// The final permitted attempt also failed transiently. The last error is
    /// carried unmodified so callers can still match on the cause.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: CallError,
    },
    /// The caller's cancellation token fired during the run.
    #[error("remote call cancelled")]
    Cancelled,
    /// The operation did not complete within the caller's deadline.
    #[error("operation deadline exceeded after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },
}

impl RetryError {
    /// The underlying call error, when one exists.
    pub fn call_error(&self) -> Option<&CallError> {
        match self {
            RetryError::Fatal(e) => Some(e),
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::Cancelled | RetryError::DeadlineExceeded { .. } => None,
        }
    }
}
