//! Anthropic provider over the Messages API.
//!
//! Anthropic does not speak the OpenAI protocol, so this adapter talks to
//! `/v1/messages` directly with `x-api-key` and `anthropic-version` headers.

use crate::http;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use windlass_core::error::ProviderError;
use windlass_core::provider::Provider;
use windlass_core::types::{OperationContext, ProviderIdentity, ProviderKind};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
// The Messages API requires max_tokens on every request.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic provider speaking the Messages API
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    identity: Arc<ProviderIdentity>,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("identity", &self.identity)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageParam<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl AnthropicProvider {
    /// Create a provider with default configuration
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a builder for more configuration options
    pub fn builder() -> AnthropicBuilder {
        AnthropicBuilder::default()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn identity(&self) -> Arc<ProviderIdentity> {
        self.identity.clone()
    }

    async fn generate(
        &self,
        prompt: &str,
        context: Option<&OperationContext>,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.identity.current_model,
            max_tokens: context
                .and_then(|ctx| ctx.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            messages: vec![MessageParam {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let mut call = self
            .request(reqwest::Method::POST, "/v1/messages")
            .json(&request);
        if let Some(timeout_ms) = context.and_then(|ctx| ctx.timeout_ms) {
            call = call.timeout(Duration::from_millis(timeout_ms));
        }

        let response = call.send().await?;
        if !response.status().is_success() {
            return Err(http::error_for_status(response).await);
        }

        let body: MessagesResponse = response.json().await?;
        Ok(body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect())
    }

    async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(provider = %self.identity.name, "availability probe failed: {error}");
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .request(reqwest::Method::GET, "/v1/models")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http::error_for_status(response).await);
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|model| model.id).collect())
    }
}

/// Builder for an Anthropic provider
#[derive(Default)]
pub struct AnthropicBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl AnthropicBuilder {
    /// Set the API key (required)
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the API base URL (default `https://api.anthropic.com`)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model to generate with
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set a client-wide request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<AnthropicProvider, ProviderError> {
        let api_key = self
            .api_key
            .ok_or_else(|| ProviderError::configuration("anthropic requires an API key"))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| ProviderKind::Anthropic.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let mut client = Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client.build().map_err(|e| {
            ProviderError::configuration(format!("failed to build http client: {e}"))
        })?;

        let mut identity = ProviderIdentity::new(
            ProviderKind::Anthropic,
            ProviderKind::Anthropic.display_name(),
            base_url.clone(),
            DEFAULT_MODEL,
        );
        if let Some(model) = self.model {
            identity = identity.with_model(model);
        }

        Ok(AnthropicProvider {
            client,
            api_key,
            base_url,
            identity: Arc::new(identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_required() {
        let error = AnthropicProvider::builder().build().unwrap_err();
        assert!(matches!(error, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_defaults() {
        let provider = AnthropicProvider::new("sk-ant-test").unwrap();
        assert_eq!(provider.identity().kind, ProviderKind::Anthropic);
        assert_eq!(provider.identity().base_url, "https://api.anthropic.com");
        assert_eq!(provider.identity().current_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_debug_output_hides_the_api_key() {
        let provider = AnthropicProvider::new("sk-ant-secret").unwrap();
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-ant-secret"));
    }

    #[test]
    fn test_messages_request_wire_shape() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet-latest",
            max_tokens: 256,
            messages: vec![MessageParam {
                role: "user",
                content: "hi",
            }],
            temperature: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["max_tokens"], 256);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Hello"},{"type":"tool_use","id":"t1"},{"type":"text","text":" world"}]}"#,
        )
        .unwrap();
        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();
        assert_eq!(text, "Hello world");
    }
}
