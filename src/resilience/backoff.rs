//! # Exponential Backoff
//!
//! Retry loop with exponentially growing, randomized delays. The loop stops on
//! success, on a failure the caller marks permanent, after `max_attempts`, or
//! when the [`CheckContext`] finishes during a backoff sleep. There is no
//! elapsed-time ceiling beyond the context.

use crate::checks::{CheckContext, ResolveError};
use crate::constants::retry;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    /// Delays are drawn from `[d - f*d, d + f*d]`; 0 disables jitter
    pub randomization_factor: f64,
    /// Total attempts including the first
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: retry::INITIAL_INTERVAL_MS,
            max_interval_ms: retry::MAX_INTERVAL_MS,
            multiplier: retry::MULTIPLIER,
            randomization_factor: retry::RANDOMIZATION_FACTOR,
            max_attempts: retry::MAX_ATTEMPTS,
        }
    }
}

impl BackoffConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }

        if self.multiplier < 1.0 {
            return Err("multiplier must be at least 1.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.randomization_factor) {
            return Err("randomization_factor must be between 0.0 and 1.0".to_string());
        }

        if self.max_interval_ms < self.initial_interval_ms {
            return Err("max_interval_ms must not be lower than initial_interval_ms".to_string());
        }

        Ok(())
    }

    /// Delay before retry number `retry_index` (0-based), before jitter
    pub fn base_delay(&self, retry_index: u32) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let scaled = self.initial_interval_ms as f64 * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_interval_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `retry_index` (0-based), with jitter.
    /// The randomization factor is clamped to `[0, 1]`.
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let delay = self.base_delay(retry_index);
        if self.randomization_factor.is_nan() || self.randomization_factor <= 0.0 {
            return delay;
        }
        // uniform in [1 - f, 1 + f]
        let spread = (fastrand::f64() * 2.0 - 1.0) * self.randomization_factor.min(1.0);
        Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + spread)).unwrap_or(delay)
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Permanent,
}

/// Terminal failure of [`retry`]
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The last failure, either permanent or after the final attempt
    #[error("failed after {attempts} attempt(s): {error}")]
    Failed { error: E, attempts: u32 },

    /// The context finished during a backoff sleep
    #[error(transparent)]
    Interrupted(ResolveError),
}

/// Run `operation` until it succeeds or `decide` / the attempt budget / the
/// context stops it. `operation` receives the 1-based attempt number.
pub async fn retry<T, E, Op, Fut, Decide>(
    ctx: &CheckContext,
    config: &BackoffConfig,
    mut operation: Op,
    mut decide: Decide,
) -> Result<T, RetryError<E>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Decide: FnMut(&E) -> RetryDecision,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempt >= max_attempts || decide(&error) == RetryDecision::Permanent {
            return Err(RetryError::Failed {
                error,
                attempts: attempt,
            });
        }

        let delay = config.delay_for(attempt - 1);
        debug!(
            attempt = attempt,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Retrying after backoff"
        );
        ctx.sleep(delay).await.map_err(RetryError::Interrupted)?;
        attempt += 1;
    }
}
