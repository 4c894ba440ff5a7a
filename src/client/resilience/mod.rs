//! Retry with exponential backoff for provider and search calls.
//!
//! Only errors reporting a status in [`crate::RETRYABLE_STATUS_CODES`] are
//! retried. Every wait between attempts races the caller's cancellation
//! token, so cancelling never has to sit out a backoff delay.

mod backoff;

pub use backoff::ExponentialBackoff;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
}

impl RetryConfig {
    /// Chat completion calls: 3 attempts, 500ms doubling up to 5s.
    pub fn api() -> Self {
        Self {
            max_attempts: 3,
            backoff: ExponentialBackoff::new(
                Duration::from_millis(500),
                Duration::from_secs(5),
                2.0,
            ),
        }
    }

    /// Search calls: 5 attempts, 100ms doubling up to 2s.
    pub fn search() -> Self {
        Self {
            max_attempts: 5,
            backoff: ExponentialBackoff::new(
                Duration::from_millis(100),
                Duration::from_secs(2),
                2.0,
            ),
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::api()
        }
    }

    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::api()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resilience {
    config: RetryConfig,
}

impl Resilience {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                result = operation() => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            let delay = self.config.backoff.delay_for(attempt);
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retryable error, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
