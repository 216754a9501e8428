//! Bounded retry with exponential backoff.
//!
//! The policy is a plain value: how many attempts, the first delay, and
//! which error kinds may be retried. Anything outside the retryable set is
//! returned after a single attempt.

use crate::clock::Clock;
use crate::errors::ErrorKind;
use crate::validate::Step;
use crate::RequesterError;
use std::time::Duration;
use tracing::warn;

/// Default total attempts per step.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Retry policy applied around each network-facing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per step, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry. Doubles for every retry after that.
    pub base_delay: Duration,

    /// Error kinds that may be retried.
    pub retryable: Vec<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            retryable: vec![ErrorKind::Network],
        }
    }
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub struct Attempted<T> {
    /// Final result: the first success, the first terminal error, or the
    /// last retryable error once attempts ran out.
    pub result: Result<T, RequesterError>,

    /// Number of attempts made.
    pub attempts: u32,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Validate the policy.
    pub fn validate(&self) -> Result<(), RequesterError> {
        if self.max_attempts == 0 {
            return Err(RequesterError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.base_delay.is_zero() {
            return Err(RequesterError::Configuration(
                "retry base delay must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether errors of `kind` may be retried.
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Delay before retry number `retry` (1-based): `base_delay * 2^(retry-1)`.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out.
    ///
    /// Delays are taken through `clock`, which blocks the calling thread.
    pub fn run<T, F>(&self, step: Step, clock: &dyn Clock, mut op: F) -> Attempted<T>
    where
        F: FnMut() -> Result<T, RequesterError>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let result = op();

            let error = match result {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts,
                    }
                }
                Err(e) => e,
            };

            if !self.is_retryable(error.kind()) || attempts >= max_attempts {
                return Attempted {
                    result: Err(error),
                    attempts,
                };
            }

            let delay = self.delay_before_retry(attempts);
            warn!(
                step = %step,
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retryable failure, backing off"
            );
            clock.sleep(delay);
        }
    }
}
