//! # Windlass Providers
//!
//! Provider implementations for the supported AI backends.
//!
//! Three adapters cover six backends:
//! - `OpenAiCompatProvider`: OpenAI, DeepSeek, LM Studio, Open WebUI
//! - `AnthropicProvider`: the Anthropic Messages API
//! - `OllamaProvider`: the native Ollama REST API

pub mod anthropic;
pub mod factory;
mod http;
pub mod ollama;
pub mod openai;

// Re-exports
pub use anthropic::{AnthropicBuilder, AnthropicProvider};
pub use factory::{create_provider, ProviderSettings};
pub use ollama::{OllamaBuilder, OllamaProvider};
pub use openai::{OpenAiCompatBuilder, OpenAiCompatProvider};

use windlass_core::error::ProviderError;
use windlass_core::types::ProviderKind;

/// Create an OpenAI provider
pub fn openai(api_key: impl Into<String>) -> Result<OpenAiCompatProvider, ProviderError> {
    OpenAiCompatProvider::builder().api_key(api_key).build()
}

/// Create a DeepSeek provider (OpenAI-compatible)
///
/// DeepSeek uses the OpenAI API protocol but with a different endpoint.
///
/// # Example
///
/// ```ignore
/// use windlass_provider::deepseek;
///
/// let provider = deepseek("your-api-key")?;
/// ```
pub fn deepseek(api_key: impl Into<String>) -> Result<OpenAiCompatProvider, ProviderError> {
    OpenAiCompatProvider::builder()
        .api_key(api_key)
        .build_with_kind(ProviderKind::DeepSeek)
}

/// Create an LM Studio provider against the default local server
pub fn lm_studio() -> Result<OpenAiCompatProvider, ProviderError> {
    OpenAiCompatProvider::builder().build_with_kind(ProviderKind::LmStudio)
}

/// Create an Open WebUI provider against the default local server
pub fn open_webui() -> Result<OpenAiCompatProvider, ProviderError> {
    OpenAiCompatProvider::builder().build_with_kind(ProviderKind::OpenWebUi)
}

/// Create an Ollama provider against the default local daemon
pub fn ollama() -> Result<OllamaProvider, ProviderError> {
    OllamaProvider::new()
}

/// Create an Anthropic provider
pub fn anthropic(api_key: impl Into<String>) -> Result<AnthropicProvider, ProviderError> {
    AnthropicProvider::new(api_key)
}
