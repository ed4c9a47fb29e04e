//! Exponential backoff policy for remote-call retries.

use anyhow::Result;
use std::time::Duration;

/// Bounded-attempt exponential backoff with a fixed multiplier and no jitter.
///
/// Attempts are 1-indexed (1 = first attempt). The policy is immutable once
/// constructed and holds no network or I/O state.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Build a policy, rejecting parameters that would disable the attempt
    /// budget or shrink delays between attempts.
    pub fn new(max_attempts: u32, initial_backoff: Duration, multiplier: f64) -> Result<Self> {
        anyhow::ensure!(
            max_attempts >= 1,
            "max_attempts must be at least 1, got {max_attempts}"
        );
        anyhow::ensure!(
            initial_backoff > Duration::ZERO,
            "initial_backoff must be positive"
        );
        anyhow::ensure!(
            multiplier >= 1.0,
            "multiplier must be at least 1.0, got {multiplier}"
        );
        Ok(Self {
            max_attempts,
            initial_backoff,
            multiplier,
        })
    }

    /// Maximum number of attempts (including the first).
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to sleep after a failed `attempt` (1-indexed):
    /// `initial_backoff * multiplier^(attempt - 1)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        // Exponent capped so an absurd attempt count saturates instead of
        // overflowing the duration arithmetic.
        let exp = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exp);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}
