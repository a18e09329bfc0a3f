//! Bounded exponential backoff for transient store failures.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::StoreError;

/// Retry settings for store requests.
///
/// Only transient codes (`UNAVAILABLE`, `DEADLINE_EXCEEDED`) are retried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry as i32);
        let millis = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(millis as u64)
    }

    /// Runs `op`, retrying transient failures with backoff.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    tracing::debug!(
                        op = label,
                        error = %e,
                        attempts_left = self.max_retries - retry,
                        "Store request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ErrorCode;

    fn instant() -> RetryPolicy {
        RetryPolicy {
            initial_delay_ms: 0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(6), Duration::from_millis(10_000));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let mut calls = 0;
        let result = instant()
            .run("get", || {
                calls += 1;
                let n = calls;
                async move {
                    if n < 3 {
                        Err(StoreError::new(ErrorCode::Unavailable, "down"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut calls = 0;
        let result: Result<(), _> = instant()
            .run("get", || {
                calls += 1;
                async { Err(StoreError::new(ErrorCode::DeadlineExceeded, "slow")) }
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::DeadlineExceeded);
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let mut calls = 0;
        let result: Result<(), _> = instant()
            .run("create", || {
                calls += 1;
                async { Err(StoreError::new(ErrorCode::PermissionDenied, "nope")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
