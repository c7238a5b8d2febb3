//! Generic retry executor with exponential backoff
//!
//! Wraps an arbitrary fallible async operation with bounded retry. The
//! backoff is deterministic (jitter-free) and grows strictly with the
//! attempt number so repeated transient failures do not hammer the remote
//! endpoint. The executor carries no state across invocations; every call
//! starts a fresh attempt counter.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Classification hook for caller error types.
///
/// Retryable errors are transient conditions where a later attempt could
/// succeed. Non-retryable errors (rejected credentials, local data-contract
/// violations) reproduce the same outcome on every attempt and abort the
/// retry loop immediately.
pub trait RetryClass {
    fn is_retryable(&self) -> bool;
}

/// Errors produced by [`run_with_retry`].
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All attempts exhausted; wraps the last underlying error.
    #[error("{label}: {attempts} attempt(s) exhausted: {source}")]
    Exhausted {
        label: String,
        attempts: u32,
        source: E,
    },

    /// The operation failed with an error that must not be retried.
    #[error("{label}: aborted without retry: {source}")]
    Aborted { label: String, source: E },
}

impl<E> RetryError<E> {
    /// The underlying operation error, regardless of how the loop ended.
    pub fn into_source(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Aborted { source, .. } => source,
        }
    }

    pub fn source_ref(&self) -> &E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Aborted { source, .. } => source,
        }
    }

    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Aborted { .. } => 1,
        }
    }
}

/// Explicit retry bounds, passed by value; no global retry state exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, including the first. Clamped to at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Delay slept before attempt `attempt` (1-based).
    ///
    /// Attempt 1 has zero pre-delay; attempt n ≥ 2 waits
    /// `base_delay * 2^(n-2)`, i.e. the k-th retry waits `base * 2^(k-1)`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt - 2))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(5) }
    }
}

/// Run `operation` under `policy`, sleeping the computed backoff between
/// attempts.
///
/// `label` names the operation in logs and in the terminal error. The
/// operation is invoked at most `policy.max_attempts` times; a
/// non-retryable error short-circuits on the spot.
pub async fn run_with_retry<T, E, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: RetryClass + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        debug!(label, attempt, max_attempts, "executing operation");

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => {
                warn!(label, attempt, %error, "non-retryable failure, aborting");
                return Err(RetryError::Aborted { label: label.to_string(), source: error });
            }
            Err(error) => {
                if attempt >= max_attempts {
                    warn!(label, attempt, %error, "all retry attempts exhausted");
                    return Err(RetryError::Exhausted {
                        label: label.to_string(),
                        attempts: attempt,
                        source: error,
                    });
                }

                let delay = policy.delay_before(attempt + 1);
                warn!(label, attempt, %error, ?delay, "operation failed, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug)]
    struct FlakyError {
        transient: bool,
    }

    impl fmt::Display for FlakyError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "flaky (transient: {})", self.transient)
        }
    }

    impl std::error::Error for FlakyError {}

    impl RetryClass for FlakyError {
        fn is_retryable(&self) -> bool {
            self.transient
        }
    }

    #[test]
    fn delay_grows_exponentially_from_base() {
        let policy = RetryPolicy::new(4, Duration::from_secs(5));
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(5));
        assert_eq!(policy.delay_before(3), Duration::from_secs(10));
        assert_eq!(policy.delay_before(4), Duration::from_secs(20));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_operation_is_invoked_exactly_max_attempts_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result: Result<(), _> =
            run_with_retry("doomed", &RetryPolicy::new(3, Duration::from_secs(5)), move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FlakyError { transient: true })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(RetryError::Exhausted { label, attempts, .. }) => {
                assert_eq!(label, "doomed");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_delays_are_five_ten_twenty_seconds() {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let ts_clone = Arc::clone(&timestamps);

        let _result: Result<(), _> =
            run_with_retry("timing", &RetryPolicy::new(4, Duration::from_secs(5)), move || {
                let timestamps = Arc::clone(&ts_clone);
                async move {
                    timestamps.lock().unwrap().push(tokio::time::Instant::now());
                    Err(FlakyError { transient: true })
                }
            })
            .await;

        let stamps = timestamps.lock().unwrap();
        assert_eq!(stamps.len(), 4);
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, vec![
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(20),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_aborts_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result: Result<(), _> =
            run_with_retry("auth", &RetryPolicy::default(), move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FlakyError { transient: false })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetryError::Aborted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success_returns_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = run_with_retry(
            "recovers",
            &RetryPolicy::new(3, Duration::from_secs(5)),
            move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                        Err(FlakyError { transient: true })
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn each_invocation_starts_a_fresh_attempt_counter() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));

        for _ in 0..2 {
            let calls = Arc::new(AtomicU32::new(0));
            let calls_clone = Arc::clone(&calls);
            let result: Result<(), _> = run_with_retry("fresh", &policy, move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FlakyError { transient: true })
                }
            })
            .await;
            assert_eq!(result.err().map(|e| e.attempts()), Some(2));
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }
    }
}
