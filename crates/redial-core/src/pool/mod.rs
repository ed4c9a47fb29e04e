//! Connection-pool bootstrap.
//!
//! The pool is the one long-lived shared resource in the process: created at
//! most once during startup, handed out to every in-flight request, closed
//! exactly once at shutdown. Initialization retries with a doubling backoff;
//! exhausting the budget is fatal to startup, there is no degraded mode.

mod bootstrap;
mod postgres;

pub use bootstrap::{init_with_retry, PoolInitError};
pub use postgres::PgPoolBootstrap;
