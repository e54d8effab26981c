//! Bounded exponential-backoff retry around a single model call

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::DomainError;

/// Retry settings as they appear in configuration (delays in seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first call
    pub max_attempts: u32,
    pub base_delay: f64,
    pub max_delay: f64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: 1.0,
            max_delay: 30.0,
            exponential_base: 2.0,
        }
    }
}

impl TryFrom<&RetryConfig> for RetryPolicy {
    type Error = DomainError;

    fn try_from(config: &RetryConfig) -> Result<Self, Self::Error> {
        if !(config.base_delay.is_finite() && config.max_delay.is_finite()) {
            return Err(DomainError::configuration(
                "retry delays must be finite numbers of seconds",
            ));
        }
        if config.base_delay <= 0.0 {
            return Err(DomainError::configuration("retry base_delay must be > 0"));
        }

        RetryPolicy::new(
            config.max_attempts,
            Duration::from_secs_f64(config.base_delay),
            Duration::from_secs_f64(config.max_delay.max(0.0)),
            config.exponential_base,
        )
    }
}

/// Executes an async operation with bounded retries
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            exponential_base: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        exponential_base: f64,
    ) -> Result<Self, DomainError> {
        if max_attempts < 1 {
            return Err(DomainError::configuration("retry max_attempts must be >= 1"));
        }
        if base_delay.is_zero() {
            return Err(DomainError::configuration("retry base_delay must be > 0"));
        }
        if max_delay < base_delay {
            return Err(DomainError::configuration(
                "retry max_delay must be >= base_delay",
            ));
        }
        if !exponential_base.is_finite() || exponential_base < 1.0 {
            return Err(DomainError::configuration(
                "retry exponential_base must be >= 1",
            ));
        }

        Ok(Self {
            max_attempts,
            base_delay,
            max_delay,
            exponential_base,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry that follows `attempt` (0-indexed)
    ///
    /// A positive server hint replaces the exponential formula; both are
    /// capped at `max_delay`.
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        if let Some(secs) = retry_after.filter(|s| *s > 0) {
            return Duration::from_secs(secs).min(self.max_delay);
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        Duration::from_secs_f64(delay)
    }

    pub fn should_retry(&self, error: &DomainError) -> bool {
        error.is_retryable()
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// The last error is returned unchanged.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !self.should_retry(&error) {
                warn!(
                    error_kind = error.kind_name(),
                    "Non-retryable error, failing immediately: {}", error
                );
                return Err(error);
            }

            if attempt + 1 >= self.max_attempts {
                error!(
                    attempts = self.max_attempts,
                    error_kind = error.kind_name(),
                    "All retry attempts exhausted: {}",
                    error
                );
                return Err(error);
            }

            let delay = self.calculate_delay(attempt, error.retry_after());
            warn!(
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error_kind = error.kind_name(),
                "Retryable error, retrying: {}",
                error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(5),
            2.0,
        )
        .unwrap()
    }

    #[test]
    fn test_default_matches_config_default() {
        let policy = RetryPolicy::try_from(&RetryConfig::default()).unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_calculate_delay_exponential() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.calculate_delay(0, None), Duration::from_secs(1));
        assert_eq!(policy.calculate_delay(1, None), Duration::from_secs(2));
        assert_eq!(policy.calculate_delay(2, None), Duration::from_secs(4));
        assert_eq!(policy.calculate_delay(4, None), Duration::from_secs(16));
        assert_eq!(policy.calculate_delay(5, None), Duration::from_secs(30)); // Capped
        assert_eq!(policy.calculate_delay(500, None), Duration::from_secs(30));
    }

    #[test]
    fn test_calculate_delay_uses_retry_after() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.calculate_delay(0, Some(7)), Duration::from_secs(7));
        assert_eq!(policy.calculate_delay(3, Some(7)), Duration::from_secs(7));
        assert_eq!(policy.calculate_delay(0, Some(120)), Duration::from_secs(30));
        // Zero hint falls back to the formula
        assert_eq!(policy.calculate_delay(1, Some(0)), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_policies_rejected() {
        assert!(RetryPolicy::new(0, Duration::from_secs(1), Duration::from_secs(2), 2.0).is_err());
        assert!(RetryPolicy::new(1, Duration::ZERO, Duration::from_secs(2), 2.0).is_err());
        assert!(RetryPolicy::new(1, Duration::from_secs(3), Duration::from_secs(2), 2.0).is_err());

        let config = RetryConfig {
            base_delay: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            RetryPolicy::try_from(&config),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(DomainError::server(503, "unavailable", None))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reraises_last_error() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(DomainError::rate_limited(format!("attempt {}", n), None)) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(DomainError::RateLimited { message, .. }) => assert_eq!(message, "attempt 2"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_called_once() {
        let policy = fast_policy(5);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DomainError::authentication("bad key")) }
            })
            .await;

        assert!(matches!(result, Err(DomainError::Authentication { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy::new(1, Duration::from_secs(60), Duration::from_secs(60), 2.0)
            .unwrap();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DomainError::timeout("slow")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
