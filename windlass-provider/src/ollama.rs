//! Ollama provider over the local REST API.
//!
//! Talks to `/api/generate` (non-streaming) and `/api/tags`. No API key is
//! involved; availability depends entirely on the local daemon.

use crate::http;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use windlass_core::error::ProviderError;
use windlass_core::provider::Provider;
use windlass_core::types::{OperationContext, ProviderIdentity, ProviderKind};

const DEFAULT_MODEL: &str = "llama3";

/// Ollama provider speaking the native REST API
#[derive(Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    identity: Arc<ProviderIdentity>,
}

impl std::fmt::Debug for OllamaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProvider")
            .field("identity", &self.identity)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn from_call(context: Option<&OperationContext>, temperature: Option<f32>) -> Option<Self> {
        let num_predict = context.and_then(|ctx| ctx.max_tokens);
        if temperature.is_none() && num_predict.is_none() {
            return None;
        }
        Some(Self {
            temperature,
            num_predict,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    /// Create a provider against the default local daemon
    pub fn new() -> Result<Self, ProviderError> {
        Self::builder().build()
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OllamaBuilder {
        OllamaBuilder::default()
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn identity(&self) -> Arc<ProviderIdentity> {
        self.identity.clone()
    }

    async fn generate(
        &self,
        prompt: &str,
        context: Option<&OperationContext>,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &self.identity.current_model,
            prompt,
            stream: false,
            options: GenerateOptions::from_call(context, temperature),
        };

        let mut call = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request);
        if let Some(timeout_ms) = context.and_then(|ctx| ctx.timeout_ms) {
            call = call.timeout(Duration::from_millis(timeout_ms));
        }

        let response = call.send().await?;
        if !response.status().is_success() {
            return Err(http::error_for_status(response).await);
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
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
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http::error_for_status(response).await);
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }
}

/// Builder for an Ollama provider
#[derive(Default)]
pub struct OllamaBuilder {
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl OllamaBuilder {
    /// Set the daemon base URL (default `http://localhost:11434`)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model to generate with (default `llama3`)
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
    pub fn build(self) -> Result<OllamaProvider, ProviderError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| ProviderKind::Ollama.default_base_url().to_string())
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
            ProviderKind::Ollama,
            ProviderKind::Ollama.display_name(),
            base_url.clone(),
            DEFAULT_MODEL,
        );
        if let Some(model) = self.model {
            identity = identity.with_model(model);
        }

        Ok(OllamaProvider {
            client,
            base_url,
            identity: Arc::new(identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let provider = OllamaProvider::new().unwrap();
        assert_eq!(provider.identity().kind, ProviderKind::Ollama);
        assert_eq!(provider.identity().base_url, "http://localhost:11434");
        assert_eq!(provider.identity().current_model, "llama3");
        assert_eq!(provider.identity().default_model, "llama3");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let provider = OllamaProvider::builder()
            .base_url("http://10.0.0.5:11434/")
            .build()
            .unwrap();
        assert_eq!(provider.identity().base_url, "http://10.0.0.5:11434");
    }

    #[test]
    fn test_custom_model_keeps_the_default_on_record() {
        let provider = OllamaProvider::builder().model("mistral").build().unwrap();
        assert_eq!(provider.identity().current_model, "mistral");
        assert_eq!(provider.identity().default_model, "llama3");
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_not_available() {
        // Port 1 on loopback is never listening.
        let provider = OllamaProvider::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        assert!(!provider.is_available().await);
        assert!(provider.list_models().await.is_err());
    }

    #[test]
    fn test_generate_request_wire_shape() {
        let request = GenerateRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
            options: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], serde_json::Value::Bool(false));
        assert!(value.get("options").is_none());

        let ctx = OperationContext::new().with_max_tokens(64);
        let request = GenerateRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
            options: GenerateOptions::from_call(Some(&ctx), Some(0.2)),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["options"]["num_predict"], 64);
    }
}
