//! Construct providers from a kind plus connection settings.

use crate::anthropic::AnthropicProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiCompatProvider;
use std::sync::Arc;
use windlass_core::error::ProviderError;
use windlass_core::provider::Provider;
use windlass_core::types::ProviderKind;

/// Connection settings shared by all provider kinds.
///
/// Every field is optional; each kind fills in its own defaults and
/// rejects combinations it cannot work with.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub organization: Option<String>,
}

impl ProviderSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the organization ID (OpenAI only)
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Build a provider for `kind` behind the capability trait.
///
/// # Example
///
/// ```ignore
/// use windlass_core::ProviderKind;
/// use windlass_provider::{create_provider, ProviderSettings};
///
/// let provider = create_provider(
///     ProviderKind::DeepSeek,
///     ProviderSettings::new().with_api_key("your-api-key"),
/// )?;
/// ```
pub fn create_provider(
    kind: ProviderKind,
    settings: ProviderSettings,
) -> Result<Arc<dyn Provider>, ProviderError> {
    match kind {
        ProviderKind::Ollama => {
            let mut builder = OllamaProvider::builder();
            if let Some(base_url) = settings.base_url {
                builder = builder.base_url(base_url);
            }
            if let Some(model) = settings.model {
                builder = builder.model(model);
            }
            Ok(Arc::new(builder.build()?))
        }
        ProviderKind::Anthropic => {
            let mut builder = AnthropicProvider::builder();
            if let Some(api_key) = settings.api_key {
                builder = builder.api_key(api_key);
            }
            if let Some(base_url) = settings.base_url {
                builder = builder.base_url(base_url);
            }
            if let Some(model) = settings.model {
                builder = builder.model(model);
            }
            Ok(Arc::new(builder.build()?))
        }
        ProviderKind::OpenAI
        | ProviderKind::DeepSeek
        | ProviderKind::LmStudio
        | ProviderKind::OpenWebUi => {
            let mut builder = OpenAiCompatProvider::builder();
            if let Some(api_key) = settings.api_key {
                builder = builder.api_key(api_key);
            }
            if let Some(base_url) = settings.base_url {
                builder = builder.api_base(base_url);
            }
            if let Some(model) = settings.model {
                builder = builder.model(model);
            }
            if let Some(organization) = settings.organization {
                builder = builder.organization(organization);
            }
            Ok(Arc::new(builder.build_with_kind(kind)?))
        }
    }
}
