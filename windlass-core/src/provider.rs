//! Provider capability contract.

use crate::error::ProviderError;
use crate::types::{OperationContext, ProviderIdentity};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Capability contract every concrete backend must satisfy.
///
/// Implementations are expected to enforce their own transport timeouts;
/// the middleware treats each call as a black box and surfaces a timeout
/// from here as a retryable failure.
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Identity fields for this provider instance
    fn identity(&self) -> Arc<ProviderIdentity>;

    /// Generate a completion for the prompt.
    ///
    /// `context` supplies the optional token budget; `temperature` is
    /// passed through when the backend supports it.
    async fn generate(
        &self,
        prompt: &str,
        context: Option<&OperationContext>,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError>;

    /// Probe whether the backend is currently reachable
    async fn is_available(&self) -> bool;

    /// List the model names the backend currently serves
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Release transport resources.
    ///
    /// The default is a no-op; HTTP-backed providers release their
    /// connections on drop.
    async fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
