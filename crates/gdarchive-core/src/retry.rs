//! Classification-driven exponential backoff
//!
//! [`RetryPolicy::run`] wraps any fallible async operation. A failure is
//! retried only if the error classifies itself as transient through
//! [`Retryable`]; the delay doubles after every retried attempt. The error of
//! the last attempt is returned unchanged.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Default delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default number of attempts, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Errors that know whether a retry could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Retry budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep before the second attempt; doubled for every following one
    pub initial_delay: Duration,
    /// Total attempts; `1` disables retrying, `0` retries indefinitely
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_attempts,
        }
    }

    /// Policy that runs the operation exactly once
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 1)
    }

    /// Runs `f` until it succeeds, fails permanently or the budget is spent
    pub async fn run<F, Fut, T, E>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut delay = self.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if attempt == self.max_attempts || !err.is_retryable() {
                        return Err(err);
                    }
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
}
