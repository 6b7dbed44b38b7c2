//! Retry policy for remote calls
//!
//! One policy parameterizes every call the client makes: bounded attempts,
//! exponential backoff capped at a maximum delay, proportional jitter, and a
//! retryable-error predicate ([`RemoteError::is_retryable`]).

use crate::config::RetryConfig;
use crate::domain::errors::RemoteError;
use crate::log_retry_attempt;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff with jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            jitter_ratio: config.jitter_ratio.clamp(0.0, 1.0),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter_ratio: 0.0,
        }
    }

    /// Backoff before retry number `retry` (1-based), without jitter
    pub fn base_delay(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Backoff before retry number `retry`, with up to `jitter_ratio` of it randomized away
    pub fn delay_for(&self, retry: usize) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter_ratio <= 0.0 || base.is_zero() {
            return base;
        }
        let spread = base.as_millis() as f64 * self.jitter_ratio;
        let offset = rand::thread_rng().gen_range(0.0..=spread);
        Duration::from_millis((base.as_millis() as f64 - offset).max(0.0) as u64)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    log_retry_attempt!(
                        attempt,
                        self.max_attempts,
                        delay.as_millis() as u64,
                        format!("{operation_name}: {e}")
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %e,
                            "Retry budget exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}
