//! Retry policy with exponential backoff
//!
//! Bounded retries for transient failures:
//! - Statuses: 429, 500, 502, 503, 504
//! - Transport: connection failures
//! - Delay before retry n (1-based): backoff_factor * 2^(n-1), capped
//!
//! Client errors other than 429 are never retried.

use crate::errors::{ClientError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// HTTP statuses treated as transient
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Maximum delay between two attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Anything an attempt can produce that carries an HTTP status
pub trait StatusCarrier {
    fn status_code(&self) -> u16;
}

impl StatusCarrier for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// Retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,

    /// Base delay multiplier in seconds
    backoff_factor: f64,

    /// Maximum delay cap
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_RETRY_ATTEMPTS,
            crate::config::DEFAULT_BACKOFF_FACTOR,
        )
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor: backoff_factor.max(0.0),
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Policy that performs exactly one attempt
    pub fn none() -> Self {
        Self::new(0, 0.0)
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Run `attempt` until it yields a non-transient outcome or retries run out.
    ///
    /// When retries are exhausted on a transient status, that last response is
    /// returned so the caller can surface its status and body.
    pub async fn execute<F, Fut, T>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: StatusCarrier,
    {
        let mut retry = 0;

        loop {
            let outcome = attempt().await;
            let reason = match &outcome {
                Ok(response) if Self::is_retryable_status(response.status_code()) => {
                    Some(format!("status {}", response.status_code()))
                }
                Err(err @ ClientError::ConnectionFailed { .. }) => Some(err.to_string()),
                _ => None,
            };
            let reason = match reason {
                Some(reason) => reason,
                None => return outcome,
            };

            if retry >= self.max_retries {
                return outcome;
            }
            // Release the connection held by a discarded response before sleeping
            drop(outcome);

            retry += 1;
            let delay = self.delay_for(retry);
            warn!(retry, max_retries = self.max_retries, ?delay, %reason, "retrying request");
            sleep(delay).await;
        }
    }

    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Upper bound on total time spent sleeping between attempts
    pub fn max_total_wait_time(&self) -> Duration {
        (1..=self.max_retries).map(|retry| self.delay_for(retry)).sum()
    }

    /// Whether a response status is worth another attempt
    pub fn is_retryable_status(status: u16) -> bool {
        RETRY_STATUSES.contains(&status)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }
}
