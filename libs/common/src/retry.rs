use crate::error::AppError;
use rand::Rng;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How a failed attempt should be treated by [`RetryPolicy::run`].
#[derive(Debug)]
pub enum RetryClass {
    Retryable(AppError),
    Fatal(AppError),
}

/// Bounded, jittered exponential backoff. One policy object per outbound
/// endpoint; attempts and delays are configuration, not code.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            max_jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after the given zero-based attempt.
    fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * self.multiplier.saturating_pow(attempt);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return backoff;
        }
        backoff + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    /// Run `op` until it succeeds, returns a fatal error, or attempts are
    /// exhausted. The closure receives the zero-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, RetryClass>>,
    {
        let mut last_error = AppError::Internal("retry policy with zero attempts".to_string());

        for attempt in 0..self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(RetryClass::Fatal(err)) => return Err(err),
                Err(RetryClass::Retryable(err)) => {
                    if attempt + 1 < self.max_attempts {
                        let delay = self.delay_for(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "attempt failed: {}, retrying",
                            err
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}

/// Retryable response classes: 5xx and 429. Other 4xx are fatal.
pub fn retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Transport-level failures (connect, timeout, body) are always retryable.
pub fn classify_transport(context: &str, err: reqwest::Error) -> RetryClass {
    RetryClass::Retryable(AppError::DependencyUnavailable(format!(
        "{}: {}",
        context, err
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 2,
            max_jitter: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(RetryClass::Retryable(AppError::DependencyUnavailable(
                            "boom".into(),
                        )))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(RetryClass::Retryable(AppError::DependencyUnavailable(
                        "still down".into(),
                    )))
                }
            })
            .await;
        assert!(matches!(result, Err(AppError::DependencyUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_stop_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(RetryClass::Fatal(AppError::InvalidInput(
                        "no account id".into(),
                    )))
                }
            })
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_classification() {
        assert!(retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(retryable_status(StatusCode::BAD_GATEWAY));
        assert!(retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!retryable_status(StatusCode::BAD_REQUEST));
        assert!(!retryable_status(StatusCode::NOT_FOUND));
    }
}
