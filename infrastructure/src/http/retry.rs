//! Retry policy with exponential backoff.
//!
//! An explicit policy object applied around a single-attempt primitive:
//! transient failures are retried up to `max_attempts` with a doubling,
//! capped, jittered delay between attempts; terminal failures pass
//! through untouched. Each retry issues a fresh attempt — results are
//! never reused across attempts.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use taskforce_application::EndpointError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default maximum attempt count (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default maximum delay between attempts in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Configuration for transient-failure retries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.1).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the retry following `failed_attempts`
    /// failures.
    ///
    /// Formula: `min(max_delay, base_delay * 2^(failed_attempts-1))`
    /// scaled by `1 + (random * 2 - 1) * jitter_factor`, where `random`
    /// is a value in `[0.0, 1.0)`.
    pub fn backoff_delay(&self, failed_attempts: u32, random: f64) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(31);
        let exponential = self.base_delay_ms.saturating_mul(1u64 << exponent);
        let capped = exponential.min(self.max_delay_ms);

        // Maps random [0,1) to [-jitter, +jitter]
        let jitter = 1.0 + (random * 2.0 - 1.0) * self.jitter_factor;
        let with_jitter = (capped as f64) * jitter;

        Duration::from_millis(with_jitter.round().max(0.0) as u64)
    }

    /// Run `attempt_fn` until it succeeds, fails terminally, exhausts
    /// `max_attempts`, or `cancel` fires during a backoff wait.
    ///
    /// Transient errors ([`EndpointError::is_transient`]) are retried;
    /// everything else is returned immediately. Exhaustion is reported as
    /// [`EndpointError::Unreachable`] carrying the attempt count and the
    /// last transient error.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        mut attempt_fn: F,
    ) -> Result<T, EndpointError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EndpointError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let error = match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_transient() => return Err(error),
                Err(error) => error,
            };

            if attempts >= self.max_attempts {
                return Err(EndpointError::Unreachable {
                    attempts,
                    last: error.to_string(),
                });
            }

            let delay = self.backoff_delay(attempts, rand::random());
            warn!(
                attempt = attempts,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                %error,
                "Transient endpoint failure, backing off"
            );

            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = token.cancelled() => return Err(EndpointError::Cancelled),
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 10,
            jitter_factor: 0.0,
        }
    }

    fn flaky(
        fail_count: u32,
        counter: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str, EndpointError>> {
        move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            if attempt < fail_count {
                std::future::ready(Err(EndpointError::Transport("connection refused".into())))
            } else {
                std::future::ready(Ok("response"))
            }
        }
    }

    #[tokio::test]
    async fn test_success_after_k_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = quick_policy(4);

        let result = policy.run(None, flaky(2, counter.clone())).await;
        assert_eq!(result.unwrap(), "response");
        // K failures then success: exactly K+1 attempts.
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_after_exactly_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = quick_policy(3);

        let result = policy.run(None, flaky(10, counter.clone())).await;
        match result {
            Err(EndpointError::Unreachable { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Unreachable, got {:?}", other.map(|_| ())),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = quick_policy(5);
        let counter_clone = counter.clone();

        let result: Result<(), _> = policy
            .run(None, move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(EndpointError::AuthRejected))
            })
            .await;

        assert!(matches!(result, Err(EndpointError::AuthRejected)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_backoff_wait() {
        let token = CancellationToken::new();
        token.cancel();
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 60_000,
            max_delay_ms: 600_000,
            jitter_factor: 0.0,
        };

        let result: Result<(), _> = policy
            .run(Some(&token), || {
                std::future::ready(Err(EndpointError::Transport("refused".into())))
            })
            .await;

        assert!(matches!(result, Err(EndpointError::Cancelled)));
    }

    #[test]
    fn test_backoff_delays_strictly_increase_until_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.0,
        };
        let d1 = policy.backoff_delay(1, 0.5);
        let d2 = policy.backoff_delay(2, 0.5);
        let d3 = policy.backoff_delay(3, 0.5);
        assert_eq!(d1, Duration::from_millis(1000));
        assert_eq!(d2, Duration::from_millis(2000));
        assert_eq!(d3, Duration::from_millis(4000));
        assert!(d1 < d2 && d2 < d3);
    }

    #[test]
    fn test_backoff_caps_at_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 20,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.backoff_delay(10, 0.5), Duration::from_millis(8000));
        // No overflow at absurd attempt counts.
        assert_eq!(policy.backoff_delay(100, 0.5), Duration::from_millis(8000));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        };
        assert_eq!(policy.backoff_delay(1, 0.0), Duration::from_millis(800));
        assert_eq!(policy.backoff_delay(1, 0.5), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(1, 1.0), Duration::from_millis(1200));
    }

    #[test]
    fn test_serde_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.base_delay_ms, DEFAULT_BASE_DELAY_MS);
    }
}
