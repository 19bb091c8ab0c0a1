//! Bounded retry with linear backoff for backend calls
//!
//! Only errors whose kind is retryable (`Unreachable`, `Timeout`) are retried.
//! Everything else is returned on the first failure.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ragstack_orchestrations::retry::{BackoffStrategy, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3).with_backoff(BackoffStrategy::Linear {
//!     base: Duration::from_secs(2),
//!     max: Duration::from_secs(10),
//! });
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Wait `base * attempt`, capped at `max`
    Linear { base: Duration, max: Duration },
    /// Retry immediately
    None,
}

impl BackoffStrategy {
    fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Linear { base, max } => base.saturating_mul(attempt).min(*max),
            BackoffStrategy::None => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Linear {
                base: Duration::from_secs(2),
                max: Duration::from_secs(10),
            },
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error,
/// or the attempt budget is spent.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= policy.max_attempts => {
                error!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "Operation failed after max retries"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.backoff.delay_for(attempt);
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
