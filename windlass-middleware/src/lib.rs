//! # Windlass Middleware
//!
//! The execution pipeline in front of every provider call.
//!
//! Pipeline stages, in order:
//! - Validation: reject malformed calls before they consume anything
//! - `SlidingWindowLimiter`: per `provider:operation` admission control
//! - `RetryPolicy`: bounded retries with exponential backoff and jitter
//! - Audit: one usage event per executed operation
//!
//! ## Usage
//!
//! ```ignore
//! use windlass_core::{OperationConfiguration, ProviderKind};
//! use windlass_middleware::OperationExecutor;
//!
//! let executor = OperationExecutor::builder()
//!     .configuration(OperationConfiguration::default().with_max_retries(3))
//!     .finish();
//!
//! let result = executor
//!     .execute(|| provider.generate("hello"), "generate", ProviderKind::Ollama, None)
//!     .await;
//! ```

pub mod executor;
pub mod rate_limit;
pub mod retry;
pub mod stats;

// Re-exports
pub use executor::{OperationExecutor, OperationExecutorBuilder};
pub use rate_limit::SlidingWindowLimiter;
pub use retry::RetryPolicy;
pub use stats::RetryCounters;
