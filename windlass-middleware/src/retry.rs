//! Bounded retry with exponential backoff and jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use windlass_core::error::{ClassifiedError, ProviderError};
use windlass_core::types::OperationConfiguration;

/// Retry policy: at most `max_retries + 1` attempts with doubling,
/// capped backoff between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with default settings
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the delay cap
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Backoff before attempt `attempt` (1-based; the first wait comes
    /// before attempt 2): `base * 2^(attempt - 2)`, capped.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2);
        let delay_ms = self.base_delay.as_millis() as f64 * 2f64.powi(exponent as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// Add uniform 0-10% jitter to a computed delay
    pub fn with_jitter(&self, delay: Duration) -> Duration {
        let factor: f64 = rand::thread_rng().gen_range(0.0..0.1);
        delay.mul_f64(1.0 + factor)
    }

    /// Drive `operation` until it succeeds, fails unretryably, or runs out
    /// of attempts. `on_retry` fires once per consumed retry, before the
    /// backoff wait.
    ///
    /// Every failure leaves through classification, including one on the
    /// final permitted attempt.
    pub async fn run<T, F, Fut, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
        R: FnMut(),
    {
        let mut attempt: u32 = 1;

        loop {
            if attempt > 1 {
                let delay = self.with_jitter(self.backoff_delay(attempt));
                tracing::debug!(
                    "retry attempt {}/{}, waiting {:?}",
                    attempt,
                    self.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let classified = ClassifiedError::from(error);
                    if classified.retryable && attempt <= self.max_retries {
                        on_retry();
                        attempt += 1;
                        continue;
                    }
                    return Err(classified);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&OperationConfiguration> for RetryPolicy {
    fn from(config: &OperationConfiguration) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_retry_delay,
            max_delay: config.max_retry_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use windlass_core::error::ErrorKind;

    fn network_error() -> ProviderError {
        ProviderError::operation("connection reset by peer", ErrorKind::NetworkError, true)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new()
            .with_base_delay(Duration::from_millis(1000))
            .with_max_delay(Duration::from_millis(30_000));

        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(4000));
        assert_eq!(policy.backoff_delay(7), Duration::from_millis(30_000));

        let mut previous = Duration::ZERO;
        for attempt in 2..=12 {
            let delay = policy.backoff_delay(attempt);
            assert!(delay >= previous);
            assert!(delay <= Duration::from_millis(30_000));
            previous = delay;
        }
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let policy = RetryPolicy::new();
        let base = Duration::from_millis(1000);
        for _ in 0..100 {
            let jittered = policy.with_jitter(base);
            assert!(jittered >= base);
            assert!(jittered <= Duration::from_millis(1100));
        }
    }

    #[tokio::test]
    async fn test_run_returns_first_success() {
        let policy = RetryPolicy::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let result = policy
            .run(
                move || {
                    let calls = calls_in_op.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, ProviderError>("ok")
                    }
                },
                || {},
            )
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_until_success() {
        let policy = RetryPolicy::new()
            .with_max_retries(3)
            .with_base_delay(Duration::from_millis(100));
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));

        let calls_in_op = calls.clone();
        let retries_in_hook = retries.clone();
        let result = policy
            .run(
                move || {
                    let calls = calls_in_op.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(network_error())
                        } else {
                            Ok("ok")
                        }
                    }
                },
                move || {
                    retries_in_hook.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_invokes_exactly_max_plus_one_when_exhausted() {
        let policy = RetryPolicy::new()
            .with_max_retries(3)
            .with_base_delay(Duration::from_millis(10));
        let calls = Arc::new(AtomicU32::new(0));

        let calls_in_op = calls.clone();
        let result: Result<(), _> = policy
            .run(
                move || {
                    let calls = calls_in_op.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(network_error())
                    }
                },
                || {},
            )
            .await;

        let error = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(error.kind, ErrorKind::NetworkError);
        assert!(error.retryable);
    }

    #[tokio::test]
    async fn test_run_stops_immediately_on_non_retryable() {
        let policy = RetryPolicy::new().with_max_retries(5);
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));

        let calls_in_op = calls.clone();
        let retries_in_hook = retries.clone();
        let result: Result<(), _> = policy
            .run(
                move || {
                    let calls = calls_in_op.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(ProviderError::authentication("invalid api key"))
                    }
                },
                move || {
                    retries_in_hook.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        let error = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(retries.load(Ordering::SeqCst), 0);
        assert_eq!(error.kind, ErrorKind::AuthenticationError);
        assert!(!error.retryable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_on_final_attempt_is_classified() {
        let policy = RetryPolicy::new()
            .with_max_retries(1)
            .with_base_delay(Duration::from_millis(10));
        let calls = Arc::new(AtomicU32::new(0));

        let calls_in_op = calls.clone();
        let result: Result<(), _> = policy
            .run(
                move || {
                    let calls = calls_in_op.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(ProviderError::timeout("upstream took too long"))
                    }
                },
                || {},
            )
            .await;

        // The failure on attempt 2 (the last permitted one) must come out
        // classified, not as some generic exhaustion message.
        let error = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(error.kind, ErrorKind::Timeout);
        assert!(error.retryable);
        assert!(error.message.contains("upstream took too long"));
    }
}
