//! Logging init: file under the XDG state dir, or stderr when unavailable.

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,redial_core=debug"))
}

/// Initialize structured logging to `~/.local/state/redial/redial.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("redial")?;
    let log_dir = xdg_dirs.get_state_home().join("redial");

    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join("redial.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("redial logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when [`init_logging`]
/// fails so the process still reports what it is doing.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
