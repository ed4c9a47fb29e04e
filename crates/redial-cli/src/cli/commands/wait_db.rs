//! Startup gate: block until the configured database pool can be initialized.

use anyhow::Result;

use redial_core::config::RedialConfig;
use redial_core::pool::PgPoolBootstrap;

pub async fn run_wait_db(cfg: &RedialConfig, dsn_override: Option<String>) -> Result<()> {
    let dsn = dsn_override.unwrap_or_else(|| cfg.pool.dsn.clone());
    let bootstrap = PgPoolBootstrap::new(dsn, cfg.pool.retries, cfg.pool.initial_backoff()?);

    // Bootstrap failure is fatal to startup; the error propagates and the
    // process exits nonzero before reporting readiness.
    bootstrap.init_once().await?;
    println!("database ready");

    bootstrap.close().await;
    Ok(())
}
