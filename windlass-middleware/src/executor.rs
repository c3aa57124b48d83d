//! Operation executor: validation, admission, retries, audit.
//!
//! This module implements the single entry point every provider call goes
//! through. `execute` runs a fixed pipeline: validate the call, check the
//! per-key rate limit, drive the operation through the retry policy, emit
//! one audit event, and hand back a typed result. Raw errors never escape;
//! callers only ever observe an [`OperationResult`].

use crate::rate_limit::SlidingWindowLimiter;
use crate::retry::RetryPolicy;
use crate::stats::RetryCounters;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use windlass_core::audit::{AuditSink, TracingAuditSink};
use windlass_core::error::{ClassifiedError, ErrorKind, ProviderError};
use windlass_core::types::{
    OperationConfiguration, OperationContext, OperationResult, OperationStatistics, ProviderKind,
};

/// Builder for an [`OperationExecutor`].
///
/// The audit sink is injected here rather than discovered globally, so
/// hosts wire their own security audit trail in explicitly.
pub struct OperationExecutorBuilder {
    configuration: OperationConfiguration,
    audit: Arc<dyn AuditSink>,
}

impl OperationExecutorBuilder {
    /// Create a builder with default configuration and the tracing sink
    pub fn new() -> Self {
        Self {
            configuration: OperationConfiguration::default(),
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Set the executor configuration
    pub fn configuration(mut self, configuration: OperationConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Set the audit sink
    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Finish building and create an executor
    pub fn finish(self) -> OperationExecutor {
        let retry = RetryPolicy::from(&self.configuration);
        let rate_limiter = SlidingWindowLimiter::new(
            self.configuration.max_requests_per_window,
            self.configuration.rate_limit_window,
        );
        OperationExecutor {
            configuration: self.configuration,
            retry,
            rate_limiter,
            retry_counters: RetryCounters::new(),
            audit: self.audit,
        }
    }
}

impl Default for OperationExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes provider operations behind validation, rate limiting and
/// bounded retries.
///
/// Safe to share across tasks; all internal state is keyed by
/// `provider:operation` and updated atomically per key.
pub struct OperationExecutor {
    configuration: OperationConfiguration,
    retry: RetryPolicy,
    rate_limiter: SlidingWindowLimiter,
    retry_counters: RetryCounters,
    audit: Arc<dyn AuditSink>,
}

impl OperationExecutor {
    /// Create a new builder
    pub fn builder() -> OperationExecutorBuilder {
        OperationExecutorBuilder::new()
    }

    /// The configuration this executor runs with
    pub fn configuration(&self) -> &OperationConfiguration {
        &self.configuration
    }

    /// Run `operation` through the middleware pipeline.
    ///
    /// The operation is a factory invoked once per attempt. Validation and
    /// rate-limit rejects resolve locally: the operation is never invoked,
    /// no audit event is emitted, and the result carries the classified
    /// rejection.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: F,
        operation_name: &str,
        provider: ProviderKind,
        context: Option<&OperationContext>,
    ) -> OperationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let started = Instant::now();
        let provider_name = provider.as_str();

        if let Err(error) = self.validate(operation_name, context) {
            tracing::debug!(
                operation = operation_name,
                provider = provider_name,
                "rejected: {}",
                error.message
            );
            return OperationResult::failure(error, operation_name, provider_name, started.elapsed());
        }

        let key = format!("{provider_name}:{operation_name}");

        if self.configuration.enable_rate_limiting && !self.rate_limiter.try_acquire(&key) {
            tracing::debug!(key = %key, "rate limit rejected");
            let error = ClassifiedError::new(
                format!(
                    "rate limit exceeded for {key}: more than {} requests in {:?}",
                    self.configuration.max_requests_per_window,
                    self.configuration.rate_limit_window
                ),
                ErrorKind::RateLimitExceeded,
                true,
            );
            return OperationResult::failure(error, operation_name, provider_name, started.elapsed());
        }

        let outcome = self
            .retry
            .run(operation, || self.retry_counters.record(&key))
            .await;

        let api_key_id = context.and_then(|ctx| ctx.api_key_id.as_deref());
        if let Err(audit_error) = self
            .audit
            .log_api_key_usage(provider_name, operation_name, outcome.is_ok(), api_key_id)
            .await
        {
            tracing::warn!(key = %key, "audit sink failed: {audit_error:#}");
        }

        match outcome {
            Ok(data) => {
                OperationResult::success(data, operation_name, provider_name, started.elapsed())
            }
            Err(error) => {
                tracing::warn!(
                    key = %key,
                    kind = ?error.kind,
                    retryable = error.retryable,
                    "operation failed: {}",
                    error.message
                );
                OperationResult::failure(error, operation_name, provider_name, started.elapsed())
            }
        }
    }

    fn validate(
        &self,
        operation_name: &str,
        context: Option<&OperationContext>,
    ) -> Result<(), ClassifiedError> {
        if operation_name.trim().is_empty() {
            return Err(ClassifiedError::new(
                "operation name must not be empty",
                ErrorKind::ValidationError,
                false,
            ));
        }
        let Some(ctx) = context else {
            return Ok(());
        };
        if ctx.max_tokens == Some(0) {
            return Err(ClassifiedError::new(
                "max_tokens must be greater than zero",
                ErrorKind::ValidationError,
                false,
            ));
        }
        if ctx.timeout_ms == Some(0) {
            return Err(ClassifiedError::new(
                "timeout_ms must be greater than zero",
                ErrorKind::ValidationError,
                false,
            ));
        }
        if let Some(prompt) = &ctx.prompt {
            let length = prompt.chars().count();
            if length > self.configuration.max_prompt_length {
                return Err(ClassifiedError::new(
                    format!(
                        "prompt length {length} exceeds maximum {}",
                        self.configuration.max_prompt_length
                    ),
                    ErrorKind::ValidationError,
                    false,
                ));
            }
        }
        Ok(())
    }

    /// Snapshot the retry and rate-limit accounting.
    ///
    /// The per-key map is a copy; totals are derived from the same copy so
    /// the snapshot is internally consistent.
    pub fn statistics(&self) -> OperationStatistics {
        let retry_count_by_operation = self.retry_counters.snapshot();
        let total_retries = retry_count_by_operation.values().copied().sum();
        let operations_with_retries = retry_count_by_operation.len();
        OperationStatistics {
            total_retries,
            operations_with_retries,
            active_rate_limit_keys: self.rate_limiter.active_keys(),
            retry_count_by_operation,
        }
    }

    /// Empty both the rate-limit and retry-counter maps
    pub fn clear_statistics(&self) {
        self.rate_limiter.clear();
        self.retry_counters.clear();
    }
}
