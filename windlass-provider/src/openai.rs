//! OpenAI-compatible provider implementation using the async-openai crate.
//!
//! One adapter covers every backend that speaks the OpenAI chat protocol:
//! OpenAI itself, DeepSeek, LM Studio and Open WebUI. The backends differ
//! only in base URL, default model and whether a real API key is required.

use async_openai::config::OpenAIConfig;
use async_openai::error::{ApiError, OpenAIError};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;
use windlass_core::error::{ErrorKind, ProviderError};
use windlass_core::provider::Provider;
use windlass_core::types::{OperationContext, ProviderIdentity, ProviderKind};

// Placeholder sent to local endpoints that ignore authentication.
const LOCAL_API_KEY: &str = "not-needed";

fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAI => "gpt-4o-mini",
        ProviderKind::DeepSeek => "deepseek-chat",
        ProviderKind::LmStudio => "local-model",
        ProviderKind::OpenWebUi => "llama3",
        ProviderKind::Ollama | ProviderKind::Anthropic => "",
    }
}

fn requires_api_key(kind: ProviderKind) -> bool {
    matches!(kind, ProviderKind::OpenAI | ProviderKind::DeepSeek)
}

/// Provider for OpenAI and OpenAI-compatible endpoints
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: Client<OpenAIConfig>,
    identity: Arc<ProviderIdentity>,
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("identity", &self.identity)
            .finish()
    }
}

impl OpenAiCompatProvider {
    /// Create a provider for OpenAI itself with default configuration
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiCompatBuilder {
        OpenAiCompatBuilder::default()
    }

    // async-openai carries its own reqwest, so transport errors are
    // converted by value instead of wrapped.
    fn map_api_error(error: OpenAIError) -> ProviderError {
        match error {
            OpenAIError::ApiError(api) => Self::from_api_error(api),
            OpenAIError::InvalidArgument(message) => ProviderError::invalid_request(message),
            OpenAIError::JSONDeserialize(source, _) => ProviderError::Serialization(source),
            transport @ OpenAIError::Reqwest(_) => {
                ProviderError::operation(transport.to_string(), ErrorKind::NetworkError, true)
            }
            other => ProviderError::other(other.to_string()),
        }
    }

    // The chat protocol reports most failures as ApiError with free-form
    // text; fish the well-known cases out of the message.
    fn from_api_error(api: ApiError) -> ProviderError {
        let lowered = api.message.to_lowercase();
        if lowered.contains("quota") || lowered.contains("billing") {
            return ProviderError::insufficient_quota(api.message);
        }
        if lowered.contains("rate limit") {
            return ProviderError::rate_limited(api.message);
        }
        if lowered.contains("api key") || lowered.contains("authentication") {
            return ProviderError::authentication(api.message);
        }
        if lowered.contains("does not exist") || lowered.contains("model not found") {
            return ProviderError::model_not_available(api.message);
        }
        ProviderError::other(api.message)
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn identity(&self) -> Arc<ProviderIdentity> {
        self.identity.clone()
    }

    async fn generate(
        &self,
        prompt: &str,
        context: Option<&OperationContext>,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ProviderError::invalid_request(format!("failed to build message: {e}")))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.identity.current_model)
            .messages([ChatCompletionRequestMessage::User(message)]);
        if let Some(max_tokens) = context.and_then(|ctx| ctx.max_tokens) {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = temperature {
            builder.temperature(temperature);
        }
        let request = builder
            .build()
            .map_err(|e| ProviderError::invalid_request(format!("failed to build request: {e}")))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(Self::map_api_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::other("response contained no choices"))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn is_available(&self) -> bool {
        match self.client.models().list().await {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(provider = %self.identity.name, "availability probe failed: {error}");
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let models = self
            .client
            .models()
            .list()
            .await
            .map_err(Self::map_api_error)?;
        Ok(models.data.into_iter().map(|model| model.id).collect())
    }
}

/// Builder for OpenAI-compatible providers
#[derive(Default)]
pub struct OpenAiCompatBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
    model: Option<String>,
}

impl OpenAiCompatBuilder {
    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the API base URL (for compatible backends like DeepSeek)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the model to generate with
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build a provider for OpenAI itself
    pub fn build(self) -> Result<OpenAiCompatProvider, ProviderError> {
        self.build_with_kind(ProviderKind::OpenAI)
    }

    /// Build a provider for any backend speaking the OpenAI protocol.
    ///
    /// Cloud backends require an API key; local ones fall back to a
    /// placeholder. Kinds with their own wire protocol are rejected.
    pub fn build_with_kind(self, kind: ProviderKind) -> Result<OpenAiCompatProvider, ProviderError> {
        if matches!(kind, ProviderKind::Ollama | ProviderKind::Anthropic) {
            return Err(ProviderError::configuration(format!(
                "{kind} does not speak the OpenAI protocol"
            )));
        }

        let api_key = match self.api_key {
            Some(api_key) => api_key,
            None if requires_api_key(kind) => {
                return Err(ProviderError::configuration(format!(
                    "{kind} requires an API key"
                )));
            }
            None => LOCAL_API_KEY.to_string(),
        };

        let base_url = self
            .api_base
            .unwrap_or_else(|| kind.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url.clone());
        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }
        let client = Client::with_config(config);

        let mut identity = ProviderIdentity::new(
            kind,
            kind.display_name(),
            base_url,
            default_model(kind),
        );
        if let Some(model) = self.model {
            identity = identity.with_model(model);
        }

        Ok(OpenAiCompatProvider {
            client,
            identity: Arc::new(identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windlass_core::error::ErrorKind;

    fn api_error(message: &str) -> ApiError {
        serde_json::from_value(serde_json::json!({ "message": message })).unwrap()
    }

    #[test]
    fn test_cloud_endpoints_require_an_api_key() {
        let error = OpenAiCompatProvider::builder().build().unwrap_err();
        assert!(matches!(error, ProviderError::Configuration(_)));

        let error = OpenAiCompatProvider::builder()
            .build_with_kind(ProviderKind::DeepSeek)
            .unwrap_err();
        assert!(matches!(error, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_local_endpoints_get_a_placeholder_key() {
        let provider = OpenAiCompatProvider::builder()
            .build_with_kind(ProviderKind::LmStudio)
            .unwrap();
        assert_eq!(provider.identity().kind, ProviderKind::LmStudio);
        assert_eq!(provider.identity().base_url, "http://localhost:1234/v1");
        assert_eq!(provider.identity().current_model, "local-model");

        let provider = OpenAiCompatProvider::builder()
            .build_with_kind(ProviderKind::OpenWebUi)
            .unwrap();
        assert_eq!(provider.identity().base_url, "http://localhost:3000/api");
    }

    #[test]
    fn test_incompatible_kinds_are_rejected() {
        for kind in [ProviderKind::Ollama, ProviderKind::Anthropic] {
            let error = OpenAiCompatProvider::builder()
                .api_key("sk-test")
                .build_with_kind(kind)
                .unwrap_err();
            assert!(matches!(error, ProviderError::Configuration(_)));
        }
    }

    #[test]
    fn test_default_models_per_kind() {
        let provider = OpenAiCompatProvider::new("sk-test").unwrap();
        assert_eq!(provider.identity().current_model, "gpt-4o-mini");

        let provider = OpenAiCompatProvider::builder()
            .api_key("sk-test")
            .model("gpt-4o")
            .build()
            .unwrap();
        assert_eq!(provider.identity().current_model, "gpt-4o");
        assert_eq!(provider.identity().default_model, "gpt-4o-mini");

        let provider = OpenAiCompatProvider::builder()
            .api_key("sk-test")
            .build_with_kind(ProviderKind::DeepSeek)
            .unwrap();
        assert_eq!(provider.identity().current_model, "deepseek-chat");
        assert_eq!(provider.identity().base_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_debug_output_hides_the_client() {
        let provider = OpenAiCompatProvider::new("sk-secret-key").unwrap();
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-secret-key"));
        assert!(rendered.contains("OpenAI"));
    }

    #[test]
    fn test_api_message_heuristics() {
        let error =
            OpenAiCompatProvider::from_api_error(api_error("You exceeded your current quota"));
        assert_eq!(error.kind(), ErrorKind::InsufficientQuota);

        let error =
            OpenAiCompatProvider::from_api_error(api_error("Rate limit reached for gpt-4o-mini"));
        assert_eq!(error.kind(), ErrorKind::RateLimitExceeded);
        assert!(error.is_retryable());

        let error = OpenAiCompatProvider::from_api_error(api_error(
            "Incorrect API key provided: sk-****",
        ));
        assert_eq!(error.kind(), ErrorKind::AuthenticationError);

        let error = OpenAiCompatProvider::from_api_error(api_error(
            "The model `gpt-9` does not exist or you do not have access to it.",
        ));
        assert_eq!(error.kind(), ErrorKind::ModelNotAvailable);

        let error = OpenAiCompatProvider::from_api_error(api_error("something odd happened"));
        assert_eq!(error.kind(), ErrorKind::UnknownError);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_decode_failures_map_to_serialization() {
        let bad_json = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error = OpenAiCompatProvider::map_api_error(OpenAIError::JSONDeserialize(
            bad_json,
            "not json".to_string(),
        ));
        assert!(matches!(error, ProviderError::Serialization(_)));
        assert_eq!(error.kind(), ErrorKind::UnknownError);
        assert!(!error.is_retryable());
    }
}
