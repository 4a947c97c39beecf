//! Generic exponential-backoff retry wrapper for fallible async calls.
//!
//! The retryable predicate is pluggable: the LLM client supplies
//! `LlmError::is_rate_limit`, so only rate-limit/quota failures burn retries.
//! Any other error propagates immediately.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const MAX_RETRIES: u32 = 3;
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Backoff parameters. Delay starts at `initial_delay`, doubles per attempt,
/// and never exceeds `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: INITIAL_RETRY_DELAY,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E: std::fmt::Display + std::fmt::Debug> {
    /// A retryable error persisted through every attempt.
    #[error("max retries ({retries}) reached: {last}")]
    Exhausted { retries: u32, last: E },

    /// The error did not match the retryable predicate; surfaced immediately.
    #[error("{0}")]
    Fatal(E),
}

impl<E: std::fmt::Display + std::fmt::Debug> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Fatal(e) => e,
        }
    }
}

/// Runs `op` up to `policy.max_retries` times, sleeping between attempts when
/// `is_retryable` matches the failure.
///
/// Delay sequence for the defaults: 2s, 4s, then a terminal `Exhausted` on the
/// third failure.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_retryable: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display + std::fmt::Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut delay = policy.initial_delay;
    // A zero-retry policy still gets one attempt
    let max_retries = policy.max_retries.max(1);

    for attempt in 0..max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) => {
                if attempt + 1 < max_retries {
                    warn!(
                        "Rate limit hit. Retrying in {}s... (Attempt {}/{})",
                        delay.as_secs(),
                        attempt + 1,
                        max_retries
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, policy.max_delay);
                } else {
                    return Err(RetryError::Exhausted {
                        retries: max_retries,
                        last: e,
                    });
                }
            }
            Err(e) => return Err(RetryError::Fatal(e)),
        }
    }

    unreachable!("retry loop always returns within max_retries attempts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, thiserror::Error)]
    enum FakeError {
        #[error("rate limit exceeded")]
        RateLimit,
        #[error("invalid request")]
        BadRequest,
    }

    fn is_rate_limit(e: &FakeError) -> bool {
        matches!(e, FakeError::RateLimit)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_2s_then_4s_then_exhausts() {
        let attempts = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> =
            retry_with_backoff(RetryPolicy::default(), is_rate_limit, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::RateLimit) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // 2s after the first failure + 4s after the second, no sleep after the last
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        match result {
            Err(RetryError::Exhausted { retries, .. }) => assert_eq!(retries, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_message_mentions_max_retries() {
        let result: Result<(), _> =
            retry_with_backoff(RetryPolicy::default(), is_rate_limit, || async {
                Err(FakeError::RateLimit)
            })
            .await;

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("max retries (3) reached"), "got: {msg}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_propagates_immediately() {
        let attempts = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> =
            retry_with_backoff(RetryPolicy::default(), is_rate_limit, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::BadRequest) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(matches!(result, Err(RetryError::Fatal(FakeError::BadRequest))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);

        let result = retry_with_backoff(RetryPolicy::default(), is_rate_limit, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FakeError::RateLimit)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_capped_at_max_delay() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_secs(16),
            max_delay: Duration::from_secs(30),
        };
        let start = Instant::now();

        let result: Result<(), _> = retry_with_backoff(policy, is_rate_limit, || async {
            Err(FakeError::RateLimit)
        })
        .await;

        assert!(matches!(result, Err(RetryError::Exhausted { .. })));
        // 16 + 30 + 30 + 30: doubled once, then capped
        assert_eq!(start.elapsed(), Duration::from_secs(106));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_runs_once() {
        let attempts = AtomicU32::new(0);

        let result: Result<u32, RetryError<FakeError>> =
            retry_with_backoff(RetryPolicy::default(), is_rate_limit, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
