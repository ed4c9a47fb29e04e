//! Transient-vs-fatal classification of remote-call failures.

use super::error::CallError;

/// Classifier verdict for one remote-call failure. Never persisted; built
/// fresh from the raw error on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub is_transient: bool,
    pub status_code: Option<u16>,
    pub message: String,
}

/// Status codes expected to resolve themselves on retry (rate limiting,
/// temporary unavailability).
fn transient_status(code: u16) -> bool {
    matches!(code, 429 | 503)
}

/// Classify a remote-call failure.
///
/// Transient iff the error carries status 429 or 503, or its display text
/// contains "429" or "503". Anything else, including errors whose shape gives
/// nothing to inspect, is fatal (fail closed on unknown shapes).
pub fn classify(err: &CallError) -> ClassifiedError {
    let message = err.to_string();
    let status_code = err.status_code();
    let is_transient = status_code.map(transient_status).unwrap_or(false)
        || message.contains("429")
        || message.contains("503");
    ClassifiedError {
        is_transient,
        status_code,
        message,
    }
}
