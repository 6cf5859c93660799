//! Linear backoff retry for remote steps.
//!
//! The delay before attempt `n + 1` is `n × base_delay`, a pure function of
//! the attempt number.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Backoff unit; the delay after failed attempt `n` is `n × base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether another attempt may follow the given (1-based) failed attempt.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &LedgerError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// A retryable failure on the final attempt is reported as
    /// [`LedgerError::RetriesExhausted`] carrying the last error.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut f: F) -> LedgerResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = LedgerResult<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) if !self.should_retry(attempt, &error) => {
                    warn!(operation, attempts = attempt, error = %error, "Retries exhausted");
                    return Err(LedgerError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
