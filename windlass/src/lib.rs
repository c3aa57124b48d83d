//! # Windlass
//!
//! Resilient execution middleware for pluggable AI backends.
//!
//! Windlass wraps every provider call in one uniform pipeline: validation,
//! per-key rate limiting, bounded retries with exponential backoff, error
//! classification and audit logging. Callers get a typed result back no
//! matter what failed underneath.
//!
//! ## Features
//!
//! - **One pipeline for every call**: the same execution guarantees for
//!   cloud and local backends
//! - **Typed failures**: raw errors are classified into stable kinds with
//!   a retryable flag instead of leaking transport details
//! - **Per-key isolation**: rate limits and retry statistics are tracked
//!   per `provider:operation` pair
//! - **Pluggable backends**: OpenAI, Anthropic, DeepSeek, Ollama, LM Studio
//!   and Open WebUI behind one capability trait
//! - **Async/await**: full async support with tokio
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! windlass = { version = "0.1", features = ["middleware", "providers"] }
//! ```
//!
//! ```ignore
//! use std::sync::Arc;
//! use windlass::middleware::OperationExecutor;
//! use windlass::{OperationConfiguration, Provider, ProviderKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create provider
//! let provider = Arc::new(windlass::provider::ollama()?);
//!
//! // Build the executor
//! let executor = OperationExecutor::builder()
//!     .configuration(OperationConfiguration::default().with_max_retries(3))
//!     .finish();
//!
//! // Generate text through the pipeline
//! let generation = provider.clone();
//! let result = executor
//!     .execute(
//!         move || {
//!             let provider = generation.clone();
//!             async move { provider.generate("What is Rust?", None, None).await }
//!         },
//!         "generate",
//!         ProviderKind::Ollama,
//!         None,
//!     )
//!     .await;
//! println!("{}", result.into_result()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Includes `middleware` and `providers`
//! - `middleware`: The execution pipeline (executor, rate limiting, retry)
//! - `providers`: Provider implementations for the supported backends
//! - `full`: All features enabled

// Re-export core types and traits
pub use windlass_core::*;

// Re-export the middleware under `middleware` module
#[cfg(feature = "windlass-middleware")]
pub mod middleware {
    //! The execution pipeline.
    pub use windlass_middleware::*;
}

// Re-export providers under `provider` module
#[cfg(feature = "windlass-provider")]
pub mod provider {
    //! AI provider implementations.
    pub use windlass_provider::*;
}

// Convenience re-exports at root level for common types
pub use windlass_core::{
    audit::{AuditSink, TracingAuditSink},
    error::{ClassifiedError, ErrorKind, ProviderError},
    provider::Provider,
    types::{
        OperationConfiguration, OperationContext, OperationResult, OperationStatistics,
        ProviderIdentity, ProviderKind,
    },
    Result,
};

#[cfg(feature = "windlass-middleware")]
pub use windlass_middleware::{OperationExecutor, OperationExecutorBuilder};

#[cfg(feature = "windlass-provider")]
pub use windlass_provider::{create_provider, ProviderSettings};

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use windlass::prelude::*;
    //! ```

    pub use crate::{
        AuditSink, ClassifiedError, ErrorKind, OperationConfiguration, OperationContext,
        OperationResult, Provider, ProviderError, ProviderKind, Result,
    };

    #[cfg(feature = "windlass-middleware")]
    pub use crate::middleware::*;

    #[cfg(feature = "windlass-provider")]
    pub use crate::provider::*;
}
