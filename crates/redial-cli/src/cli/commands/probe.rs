//! HEAD probe through the retry envelope.
//!
//! The curl integration lives here, not in the core: each remote integration
//! maps its own error shape onto `CallError` so the classifier stays
//! provider-agnostic.

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use redial_core::config::RedialConfig;
use redial_core::retry::{run_blocking_with_retry, CallError};

/// Map a curl failure onto the envelope's normalized error shape.
fn map_curl_error(e: curl::Error) -> CallError {
    CallError::Message(e.to_string())
}

/// One HEAD attempt; returns the response status on success (2xx).
/// Blocking; run through `run_blocking_with_retry`.
fn head_once(url: &str) -> Result<u16, CallError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(map_curl_error)?;
    easy.nobody(true).map_err(map_curl_error)?;
    easy.follow_location(true).map_err(map_curl_error)?;
    easy.connect_timeout(Duration::from_secs(15))
        .map_err(map_curl_error)?;
    easy.timeout(Duration::from_secs(30)).map_err(map_curl_error)?;
    easy.perform().map_err(map_curl_error)?;

    let code = easy.response_code().map_err(map_curl_error)? as u16;
    if !(200..300).contains(&code) {
        return Err(CallError::Status {
            code,
            message: format!("HEAD returned HTTP {code}"),
        });
    }
    Ok(code)
}

pub async fn run_probe(cfg: &RedialConfig, url: &str, max_attempts: Option<u32>) -> Result<()> {
    let mut settings = cfg.retry.clone();
    if let Some(n) = max_attempts {
        settings.max_attempts = n;
    }
    let policy = settings.policy()?;
    let cancel = CancellationToken::new();

    let target = url.to_string();
    let code = run_blocking_with_retry(&policy, &cancel, move || head_once(&target)).await?;
    println!("HEAD {} -> HTTP {}", url, code);
    Ok(())
}
