//! Bounded retries for store calls.
//!
//! Two flavours, chosen by whether the call is idempotent:
//!
//! * [`RetryPolicy::run`] retries every transient failure. Only safe when re-sending the
//!   same request cannot apply it twice (reads, set-to-value writes, appends keyed by id).
//! * [`RetryPolicy::run_at_most_once`] retries only failures where the request never
//!   reached the store. An ambiguous failure is returned to the caller as-is.

use crate::config::StorefrontConfig;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How a failed store call may be treated.
pub trait StoreFailure: Display {
    /// The store did not answer; the same request may succeed later.
    fn is_transient(&self) -> bool;
    /// The request may have been applied.
    fn is_ambiguous(&self) -> bool;
}

impl StoreFailure for ProductError {
    fn is_transient(&self) -> bool {
        ProductError::is_transient(self)
    }

    fn is_ambiguous(&self) -> bool {
        ProductError::is_ambiguous(self)
    }
}

impl StoreFailure for UserError {
    fn is_transient(&self) -> bool {
        UserError::is_transient(self)
    }

    fn is_ambiguous(&self) -> bool {
        UserError::is_ambiguous(self)
    }
}

/// Attempt count with a linear backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            attempts: config.store_retry_attempts,
            backoff: config.retry_backoff,
        }
    }

    /// Delay before attempt `failures + 1`.
    pub fn delay(&self, failures: u32) -> Duration {
        self.backoff.saturating_mul(failures)
    }

    pub async fn pause(&self, failures: u32) {
        let delay = self.delay(failures);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Run an idempotent call, retrying transient failures.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: StoreFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry_while(&mut op, E::is_transient).await
    }

    /// Run a call that must not be applied twice, retrying only failures that left the
    /// store untouched.
    pub async fn run_at_most_once<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: StoreFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry_while(&mut op, |e: &E| e.is_transient() && !e.is_ambiguous())
            .await
    }

    async fn retry_while<T, E, F, Fut>(
        &self,
        op: &mut F,
        retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        E: StoreFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut failures = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && failures + 1 < attempts => {
                    failures += 1;
                    debug!(attempt = failures, error = %e, "Retrying store call");
                    self.pause(failures).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::from_millis(1),
        }
    }

    fn failure(ambiguous: bool) -> ProductError {
        ProductError::ActorCommunicationError {
            reason: "down".into(),
            ambiguous,
            transient: true,
        }
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(25),
        };
        assert_eq!(policy.delay(0), Duration::ZERO);
        assert_eq!(policy.delay(2), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, ProductError> = policy(3)
            .run(move || async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(failure(true)),
                    n => Ok(n),
                }
            })
            .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), ProductError> = policy(3)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure(false))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_at_most_once_stops_on_ambiguous_failure() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), ProductError> = policy(5)
            .run_at_most_once(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure(true))
            })
            .await;
        assert!(result.unwrap_err().is_ambiguous());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_definite_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), ProductError> = policy(5)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProductError::EmptyName)
            })
            .await;
        assert_eq!(result, Err(ProductError::EmptyName));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
