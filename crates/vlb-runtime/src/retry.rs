use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};
use vlb_config::RetryConfig;
use vlb_source::SourceError;
use vlb_store::StoreError;

/// Errors that know whether another attempt could succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        SourceError::is_transient(self)
    }
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

/// Run `op` up to `policy.max_attempts` times with exponential backoff
/// (doubling, capped at `max_backoff_ms`). Non-transient errors return
/// immediately.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryConfig, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff_ms;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(what, attempt, error = %e, "transient failure");
                info!(what, "retrying in {}ms", backoff);
                sleep(Duration::from_millis(backoff)).await;
                backoff = backoff.saturating_mul(2).min(policy.max_backoff_ms);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
