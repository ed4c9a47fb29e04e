//! Postgres pool bootstrap: DNS check, connect, idempotent shared handle.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use super::bootstrap::{InitOnce, PoolInitError};

/// One-time bootstrap of the service's Postgres pool.
///
/// `init_once` may be called from any number of tasks; the pool is created at
/// most once per instance and later calls return the existing handle. The
/// pool itself synchronizes connection hand-out internally, so the shared
/// reference is safe for concurrent use.
pub struct PgPoolBootstrap {
    dsn: String,
    retries: u32,
    initial_backoff: Duration,
    max_connections: u32,
    pool: InitOnce<Pool<Postgres>>,
}

impl PgPoolBootstrap {
    pub fn new(dsn: impl Into<String>, retries: u32, initial_backoff: Duration) -> Self {
        Self {
            dsn: dsn.into(),
            retries,
            initial_backoff,
            max_connections: 8,
            pool: InitOnce::new(),
        }
    }

    /// Initialize the pool if needed and return the shared handle.
    ///
    /// Exhausting the retry budget is fatal to startup; the caller must not
    /// proceed to accept traffic without a working pool.
    pub async fn init_once(&self) -> std::result::Result<&Pool<Postgres>, PoolInitError> {
        self.pool
            .get_or_init_with_retry(self.retries, self.initial_backoff, |attempt| {
                tracing::debug!(attempt, "opening database pool");
                connect(&self.dsn, self.max_connections)
            })
            .await
    }

    /// The handle, if `init_once` has already succeeded.
    pub fn get(&self) -> Option<&Pool<Postgres>> {
        self.pool.get()
    }

    /// Close the pool. Call exactly once at shutdown; a no-op if the pool was
    /// never initialized.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}

/// One connect attempt: resolve the DSN host first, so a DNS failure (e.g. a
/// container name that is not up yet) is reported and retried the same way as
/// a refused connection.
async fn connect(dsn: &str, max_connections: u32) -> Result<Pool<Postgres>> {
    let (host, port) = host_port(dsn)?;
    tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("resolving database host {host}"))?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(dsn)
        .await
        .context("opening database pool")?;
    Ok(pool)
}

/// Host and port from a `postgres://` / `postgresql://` DSN.
fn host_port(dsn: &str) -> Result<(String, u16)> {
    let url = url::Url::parse(dsn).context("invalid database DSN")?;
    anyhow::ensure!(
        matches!(url.scheme(), "postgres" | "postgresql"),
        "unsupported DSN scheme {:?}",
        url.scheme()
    );
    let host = url.host_str().unwrap_or("localhost").to_string();
    let port = url.port().unwrap_or(5432);
    Ok((host, port))
}
