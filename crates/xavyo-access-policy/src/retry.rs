//! Exponential backoff retry for policy API calls.

use crate::error::{PolicyError, PolicyResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy; the delay cap defaults to 60 seconds.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Whether the error is transient: network, timeout, rate limit or a 5xx.
    #[must_use]
    pub fn is_transient(error: &PolicyError) -> bool {
        error.is_retryable() || error.is_server_error()
    }

    /// Whether the error should be retried at the given attempt number.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &PolicyError) -> bool {
        attempt < self.max_retries && Self::is_transient(error)
    }

    /// Delay before retrying after `attempt`.
    ///
    /// A rate-limit error carrying `Retry-After` waits that long (capped at
    /// `max_delay`); otherwise `min(base_delay * 2^attempt, max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &PolicyError) -> Duration {
        if let PolicyError::RateLimited {
            retry_after_secs: Some(retry_after),
        } = error
        {
            return Duration::from_secs(*retry_after).min(self.max_delay);
        }

        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Execute an async operation with retry.
    ///
    /// `f` is called until it succeeds, fails with a permanent error, or the
    /// retry budget runs out. A transient error left over after the last
    /// attempt is reported as [`PolicyError::MaxRetriesExceeded`].
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> PolicyResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = PolicyResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if !Self::is_transient(&error) => return Err(error),
                Err(error) if attempt >= self.max_retries => {
                    if self.max_retries == 0 {
                        return Err(error);
                    }
                    warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = %error,
                        "Max retries exceeded"
                    );
                    return Err(PolicyError::MaxRetriesExceeded {
                        attempts: attempt + 1,
                        message: format!(
                            "{operation_name} failed after {} attempt(s): {error}",
                            attempt + 1
                        ),
                    });
                }
                Err(error) => {
                    let delay = self.delay_for(attempt, &error);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
