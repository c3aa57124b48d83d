//! # Windlass Core
//!
//! Core abstractions for the Windlass operation middleware.
//!
//! This crate provides the error taxonomy and classifier, the provider
//! capability contract, the audit sink contract, and the result and
//! configuration types shared by the middleware and provider crates.

pub mod audit;
pub mod error;
pub mod provider;
pub mod types;

// Re-exports
pub use audit::{AuditSink, TracingAuditSink};
pub use error::{classify, ClassifiedError, ErrorKind, ProviderError};
pub use provider::Provider;
pub use types::*;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
