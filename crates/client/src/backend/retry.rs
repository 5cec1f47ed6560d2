//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use super::BackendError;

/// Upper bound on any single wait, including server-provided `Retry-After`.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times to attempt a backend call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts the first try and is at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
        }
    }

    /// Total attempts allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the `attempt`-th failure (1-based): `base × 2^(attempt-1)`, capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff.saturating_mul(factor).min(MAX_DELAY)
    }

    fn delay_for(&self, attempt: u32, err: &BackendError) -> Duration {
        match err {
            BackendError::RateLimited(secs) => Duration::from_secs(*secs)
                .max(self.backoff(attempt))
                .min(MAX_DELAY),
            _ => self.backoff(attempt),
        }
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `call` is invoked afresh for every attempt, so it must rebuild its
    /// request each time. Callers that write must make the request idempotent.
    ///
    /// # Errors
    ///
    /// Returns the last error from `call`.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt, &err);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Backend call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(operation, attempt, error = %err, "Backend call failed");
                    return Err(err);
                }
            }
        }
    }
}
