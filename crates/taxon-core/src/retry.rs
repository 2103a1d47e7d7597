//! Retry policy with capped exponential backoff and jitter.
//!
//! Every external-service call in taxon goes through [`retry_with_backoff`].
//! Failures are classified by [`FailureClass`] into transient (retried) and
//! fatal (surfaced immediately). The controller never swallows an error:
//! after the retry budget is exhausted the original error is returned to the
//! caller, which decides whether to propagate or degrade.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::defaults;
use crate::error::{Error, Result};

/// Retry/backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay; doubled per attempt and also the jitter range.
    pub base_delay: Duration,
    /// Cap on the exponential component of the delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            base_delay: Duration::from_millis(defaults::BASE_DELAY_MS),
            max_delay: Duration::from_millis(defaults::MAX_DELAY_MS),
        }
    }
}

impl BackoffConfig {
    /// Delay before retry `attempt` (0-based): `min(max_delay, base * 2^attempt)`
    /// plus uniform jitter in `[0, base_delay)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        let exp = (base * 2f64.powi(attempt as i32)).min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.0..base.max(f64::EPSILON));
        Duration::from_secs_f64(exp + jitter)
    }
}

/// Closed classification of failures for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying: rate limits, outages, timeouts, connection resets,
    /// and a fixed set of HTTP statuses.
    Transient,
    /// Not worth retrying: aborts immediately without consuming the budget.
    Fatal,
}

/// Classify an error as transient or fatal.
pub fn classify(err: &Error) -> FailureClass {
    match err {
        Error::RateLimited(_)
        | Error::ServiceUnavailable(_)
        | Error::Timeout(_)
        | Error::Connection(_) => FailureClass::Transient,
        Error::Http { status, .. } if defaults::RETRYABLE_HTTP_STATUS.contains(status) => {
            FailureClass::Transient
        }
        _ => FailureClass::Fatal,
    }
}

/// Run `op`, retrying transient failures up to `cfg.max_retries` times.
///
/// Each retry waits `delay_for_attempt` and is logged with the attempt
/// number and cause. Fatal errors and exhausted budgets return the original
/// error.
pub async fn retry_with_backoff<T, F, Fut>(cfg: &BackoffConfig, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 0..=cfg.max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if classify(&err) == FailureClass::Fatal || attempt == cfg.max_retries {
                    return Err(err);
                }
                warn!(
                    op = label,
                    attempt = attempt + 1,
                    max_retries = cfg.max_retries,
                    error = %err,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(cfg.delay_for_attempt(attempt)).await;
            }
        }
    }
    unreachable!("retry loop returns on success, fatal error, or exhausted budget")
}
