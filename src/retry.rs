//! Retry policy for calls to unreliable external services.
//!
//! Every attempt is preceded by a uniformly random delay, which keeps request
//! bursts from looking automated. Failures are classified through the
//! [`Retryable`] trait:
//!
//! - non-transient errors are returned immediately,
//! - transient errors are retried until `max_attempts` is reached,
//! - rate-limit errors additionally wait `rate_limit_wait * 2^(n-1)`, capped
//!   at `max_rate_limit_wait`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Classification of an error for retry purposes.
pub trait Retryable {
    /// Whether another attempt may succeed.
    fn is_transient(&self) -> bool;

    /// Whether the remote side asked us to slow down.
    fn is_rate_limited(&self) -> bool {
        false
    }
}

/// Bounded retry with randomised delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Lower bound of the pre-attempt delay.
    pub min_delay: Duration,
    /// Upper bound of the pre-attempt delay.
    pub max_delay: Duration,
    /// Base wait after a rate-limited attempt.
    pub rate_limit_wait: Duration,
    /// Upper bound for the rate-limit wait.
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(1500),
            rate_limit_wait: Duration::from_secs(5),
            max_rate_limit_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps. Useful for tests and offline sources.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rate_limit_wait: Duration::ZERO,
            max_rate_limit_wait: Duration::ZERO,
        }
    }

    /// Picks the random delay that precedes an attempt.
    #[allow(clippy::cast_possible_truncation)]
    pub fn jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let low = self.min_delay.as_millis() as u64;
        let high = (self.max_delay.as_millis() as u64).max(low);
        Duration::from_millis(rng.gen_range(low..=high))
    }

    /// Wait after the given (1-based) rate-limited attempt.
    #[must_use]
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.rate_limit_wait
            .saturating_mul(1u32 << exp)
            .min(self.max_rate_limit_wait)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `label` only appears in log output.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `op`.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let delay = self.jitter(&mut rand::thread_rng());
            if !delay.is_zero() {
                tracing::debug!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Waiting before request"
                );
                tokio::time::sleep(delay).await;
            }

            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_transient() {
                tracing::debug!(operation = label, error = %error, "Permanent failure, not retrying");
                return Err(error);
            }
            if attempt >= max_attempts {
                tracing::warn!(
                    operation = label,
                    attempts = attempt,
                    error = %error,
                    "Giving up after repeated failures"
                );
                return Err(error);
            }

            tracing::warn!(operation = label, attempt, error = %error, "Transient failure, retrying");

            if error.is_rate_limited() {
                let wait = self.rate_limit_delay(attempt);
                tracing::info!(
                    operation = label,
                    wait_secs = wait.as_secs_f64(),
                    "Possible rate limiting detected, backing off"
                );
                tokio::time::sleep(wait).await;
            }

            attempt += 1;
        }
    }
}
