//! Retry for remote reads.
//!
//! A failed read is retried once after a fixed pause. Only transient failures
//! are retried:
//! - Timeouts and dropped connections
//! - 5xx, 429 and 408 responses
//!
//! Rejected tokens, unknown locations and malformed bodies fail immediately.

use std::future::Future;
use std::time::Duration;

use crate::types::FetchError;

pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Pause before each retry; constant, no backoff
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

/// Errors that know whether they are transient
pub trait Retryable {
    fn retry_decision(&self) -> RetryDecision;
}

impl Retryable for FetchError {
    fn retry_decision(&self) -> RetryDecision {
        if self.is_retryable() {
            RetryDecision::Retry
        } else {
            RetryDecision::NoRetry
        }
    }
}

/// Run `operation`, retrying transient failures per `config`.
///
/// Returns the first success, the first permanent failure, or the last
/// transient failure once retries are exhausted.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!("Request succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Err(e) if e.retry_decision() == RetryDecision::NoRetry => {
                tracing::debug!("Non-retryable error: {}", e);
                return Err(e);
            }
            Err(e) if attempt >= config.max_retries => {
                tracing::warn!("Giving up after {} attempts: {}", attempt + 1, e);
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    "Retryable error, attempt {} of {} in {:?}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    config.delay,
                    e
                );
                tokio::time::sleep(config.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.delay, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, FetchError> = with_retry(&RetryConfig::default(), || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(FetchError::Timeout)
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_single_retry() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), FetchError> = with_retry(&RetryConfig::default(), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Server {
                status: 503,
                message: "down".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(FetchError::Server { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), FetchError> = with_retry(&RetryConfig::default(), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::NotFound("Atlantis".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<(), FetchError> = with_retry(&RetryConfig::default(), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Unauthorized)
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
