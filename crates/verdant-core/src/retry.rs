//! Retry logic for gateway and cloud calls.
//!
//! The engine components themselves never retry: the monitor reports
//! current truth, the poller has its next tick, and batch operations skip
//! failed items. Retrying belongs to the caller of a one-shot operation,
//! typically a user-initiated control call against the gateway's flaky AP.
//!
//! # Example
//!
//! ```
//! use verdant_core::{with_retry, Failure, RetryConfig};
//!
//! # async fn example() -> Result<(), Failure> {
//! let config = RetryConfig::new(3);
//!
//! let result = with_retry(&config, "trigger_irrigation", || async {
//!     // Your gateway call here
//!     Ok::<_, Failure>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Result;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means no retries).
    pub max_retries: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries (for exponential backoff).
    pub max_delay: Duration,
    /// Backoff multiplier (1.0 = constant delay, 2.0 = double each time).
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// No retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Retry configuration for user-initiated control calls.
    ///
    /// Valve and config commands are interactive; the user is watching, so
    /// retries are few and quick.
    pub fn for_control() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Calculate the delay before the retry after `attempt` failures.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let mut delay = Duration::from_millis(base_ms as u64).min(self.max_delay);

        if self.jitter && !delay.is_zero() {
            // Up to +25% keeps synchronized callers from hammering in lockstep.
            let extra = rand::rng().random_range(0..=delay.as_millis() as u64 / 4);
            delay += Duration::from_millis(extra);
        }
        delay
    }
}

/// Run an operation, retrying transient failures with backoff.
///
/// Only failures where [`Failure::is_retryable`](crate::Failure::is_retryable)
/// holds are retried; anything else is returned immediately.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{operation} succeeded after {attempt} retries");
                }
                return Ok(value);
            }
            Err(failure) => {
                if !failure.is_retryable() || attempt >= config.max_retries {
                    return Err(failure);
                }

                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                warn!(
                    "{operation} failed ({failure}); retry {attempt}/{} in {delay:?}",
                    config.max_retries
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::Failure;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&RetryConfig::new(5), "probe", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Failure::Connection("refused".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_returns_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<u32> = with_retry(&RetryConfig::new(5), "fetch", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Failure::NotFound("010124.json".into())) }
        })
        .await;

        assert!(matches!(result, Err(Failure::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_failure() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(2);

        let result: Result<u32> = with_retry(&config, "fetch", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Failure::Timeout(Duration::from_secs(5))) }
        })
        .await;

        assert!(matches!(result, Err(Failure::Timeout(_))));
        // Initial attempt plus two retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(800));
        assert_eq!(config.delay_for_attempt(10), config.max_delay);
    }
}
