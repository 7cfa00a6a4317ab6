//! Retry with exponential backoff
//!
//! Wraps any fallible async operation with a bounded retry loop. Rate-limit
//! failures (HTTP 429 and friends) double the backoff delay since the node
//! needs real breathing room, not just a jittered re-poke.

use std::future::Future;
use std::time::Duration;

/// Default number of retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Delay ceiling
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Options controlling the backoff schedule
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Retries after the first attempt (3 => up to 4 attempts total)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryOptions {
    /// Options with a custom retry count, default delays
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }
}

/// Heuristic: does this error message look like a rate-limit response?
pub fn is_rate_limit_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
}

/// Execute `op`, retrying on failure with exponential backoff.
///
/// Delay for attempt `n` (0-based) is `base * 2^n`, doubled again when the
/// failure looks rate-limit-related, capped at `max_delay`. The last error
/// propagates once retries are exhausted. No shared state; every call is
/// independent.
pub async fn with_backoff<T, E, F, Fut>(opts: &RetryOptions, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= opts.max_retries {
                    return Err(err);
                }
                let message = err.to_string();
                let factor: u64 = if is_rate_limit_error(&message) { 2 } else { 1 };
                let base_ms = opts.base_delay.as_millis() as u64;
                let delay_ms = base_ms
                    .saturating_mul(2u64.saturating_pow(attempt.min(16)))
                    .saturating_mul(factor)
                    .min(opts.max_delay.as_millis() as u64);

                tracing::warn!(
                    "Attempt {}/{} failed ({}), retrying in {}ms",
                    attempt + 1,
                    opts.max_retries + 1,
                    message,
                    delay_ms
                );

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_opts(max_retries: u32) -> RetryOptions {
        RetryOptions {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit_error("HTTP status client error (429)"));
        assert!(is_rate_limit_error("Rate limit exceeded"));
        assert!(is_rate_limit_error("Too Many Requests"));
        assert!(!is_rate_limit_error("connection reset by peer"));
        assert!(!is_rate_limit_error("account not found"));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_backoff(&fast_opts(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_backoff(&fast_opts(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = with_backoff(&fast_opts(2), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("boom {}", n)) }
        })
        .await;

        // 1 initial attempt + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "boom 2");
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = with_backoff(&fast_opts(0), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("nope".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
