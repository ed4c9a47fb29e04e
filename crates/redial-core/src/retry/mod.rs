//! Retry envelope for unreliable remote calls.
//!
//! This module encapsulates error classification (rate limiting, temporary
//! unavailability) and exponential backoff so that every remote integration
//! (embedding lookups, provider uploads, pool bootstrap callers) shares a
//! consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, ClassifiedError};
pub use error::{CallError, RetryError};
pub use policy::RetryPolicy;
pub use run::{run_blocking_with_retry, run_with_retry};
