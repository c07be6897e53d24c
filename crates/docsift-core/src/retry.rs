//! Retry policy shared by the analysis client and the storage backends.

use std::future::Future;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Bounded retry with exponential backoff: the delay before retry `n` (0-based)
/// is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay to wait before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is exhausted. The last error is returned.
    pub async fn run<T, E, F, Fut>(&self, is_retryable: impl Fn(&E) -> bool, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut retry = 0;
        loop {
            match op(retry + 1).await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.max_retries && is_retryable(&e) => {
                    let delay = self.delay_for(retry);
                    tracing::warn!(
                        error = %e,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Classify an error message as transient (timeouts, dropped connections,
/// upstream unavailability, throttling).
pub fn is_transient_message(message: &str) -> bool {
    const PATTERNS: &[&str] = &[
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "connection closed",
        "broken pipe",
        "econnreset",
        "econnrefused",
        "service unavailable",
        "bad gateway",
        "gateway timeout",
        "overloaded",
        "rate limit",
        "too many requests",
        "slowdown",
        "slow down",
        "throttl",
    ];
    let lower = message.to_lowercase();
    PATTERNS.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn transient_patterns() {
        assert!(is_transient_message("Connection reset by peer"));
        assert!(is_transient_message("request timed out"));
        assert!(is_transient_message("503 Service Unavailable"));
        assert!(is_transient_message("SlowDown: please reduce your request rate"));
        assert!(!is_transient_message("AccessDenied"));
        assert!(!is_transient_message("invalid request body"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_after_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let result: Result<(), String> = policy
            .run(
                |_| true,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("connection reset".to_string()) }
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn run_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = RetryPolicy::default()
            .run(
                |e: &String| is_transient_message(e),
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("access denied".to_string()) }
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
