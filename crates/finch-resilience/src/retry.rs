// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use finch_config::model::ResilienceConfig;
use finch_core::FinchError;
use rand::Rng;
use tracing::{debug, warn};

/// Attempt ceiling and delay schedule for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub base_delay: Duration,
    /// Upper bound (inclusive) of the uniform jitter added to every delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// A single attempt with no delays.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1`, without jitter. `attempt` starts at 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    fn jitter(&self) -> Duration {
        let max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt ceiling is reached.
///
/// Only errors for which [`FinchError::is_retryable`] holds are retried. The
/// last error is returned unchanged.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, FinchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FinchError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt) + policy.jitter();
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    ?delay,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
            max_jitter: Duration::from_millis(100),
        }
    }

    #[test]
    fn backoff_doubles() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_millis(300));
        assert_eq!(p.backoff(2), Duration::from_millis(600));
        assert_eq!(p.backoff(3), Duration::from_millis(1200));
    }

    #[test]
    fn jitter_stays_in_range() {
        let p = policy();
        for _ in 0..200 {
            assert!(p.jitter() <= Duration::from_millis(100));
        }
        assert_eq!(RetryPolicy::no_retry().jitter(), Duration::ZERO);
    }

    #[test]
    fn defaults_follow_config() {
        let p = RetryPolicy::default();
        assert_eq!(p, policy());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry_with_backoff(&policy(), "complete", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(FinchError::provider("503"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = retry_with_backoff(&policy(), "embed", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FinchError::Timeout {
                    duration: Duration::from_secs(25),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(FinchError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_fail_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = retry_with_backoff(&policy(), "save", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FinchError::RateLimited {
                    retry_after: Duration::from_secs(30),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(FinchError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_grow_between_attempts() {
        let start = tokio::time::Instant::now();
        let _: Result<(), _> = retry_with_backoff(&policy(), "complete", || async {
            Err(FinchError::provider("boom"))
        })
        .await;
        let elapsed = start.elapsed();
        // 300ms + 600ms of backoff, plus up to 2 x 100ms of jitter.
        assert!(elapsed >= Duration::from_millis(900), "elapsed {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(1100), "elapsed {elapsed:?}");
    }
}
