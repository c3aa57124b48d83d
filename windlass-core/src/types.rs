//! Core types for executed operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ClassifiedError, ProviderError};

/// Supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    LmStudio,
    OpenWebUi,
    OpenAI,
    Anthropic,
    DeepSeek,
}

impl ProviderKind {
    /// Canonical lowercase name, used in operation keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::LmStudio => "lmstudio",
            ProviderKind::OpenWebUi => "openwebui",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "Ollama",
            ProviderKind::LmStudio => "LM Studio",
            ProviderKind::OpenWebUi => "Open WebUI",
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::DeepSeek => "DeepSeek",
        }
    }

    /// Default API base URL for this backend.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "http://localhost:11434",
            ProviderKind::LmStudio => "http://localhost:1234/v1",
            ProviderKind::OpenWebUi => "http://localhost:3000/api",
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "lmstudio" | "lm-studio" | "lm_studio" => Ok(Self::LmStudio),
            "openwebui" | "open-webui" | "open_webui" => Ok(Self::OpenWebUi),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(ProviderError::configuration(format!(
                "unknown provider type: {other}"
            ))),
        }
    }
}

/// Identity fields describing a constructed provider instance.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub kind: ProviderKind,
    pub name: String,
    pub base_url: String,
    pub default_model: String,
    pub current_model: String,
}

impl ProviderIdentity {
    /// Create an identity with the current model set to the default
    pub fn new(
        kind: ProviderKind,
        name: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        let default_model = default_model.into();
        Self {
            kind,
            name: name.into(),
            base_url: base_url.into(),
            current_model: default_model.clone(),
            default_model,
        }
    }

    /// Switch the model this instance targets
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.current_model = model.into();
        self
    }
}

/// Per-call metadata passed alongside an executed operation.
///
/// `api_key_id` is an opaque reference for audit trails; the raw secret
/// never travels through the middleware.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub request_id: String,
    pub api_key_id: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub prompt: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl OperationContext {
    /// Create an empty context with a fresh request id
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            api_key_id: None,
            max_tokens: None,
            timeout_ms: None,
            prompt: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the opaque api-key id
    pub fn with_api_key_id(mut self, api_key_id: impl Into<String>) -> Self {
        self.api_key_id = Some(api_key_id.into());
        self
    }

    /// Set the token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the request timeout in milliseconds
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the prompt text
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set free-form metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide tunables for the operation executor.
#[derive(Debug, Clone)]
pub struct OperationConfiguration {
    pub max_retries: u32,
    pub base_retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub enable_rate_limiting: bool,
    pub max_requests_per_window: usize,
    pub rate_limit_window: Duration,
    pub max_prompt_length: usize,
}

impl Default for OperationConfiguration {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_millis(30_000),
            enable_rate_limiting: true,
            max_requests_per_window: 60,
            rate_limit_window: Duration::from_secs(60),
            max_prompt_length: 100_000,
        }
    }
}

impl OperationConfiguration {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_base_retry_delay(mut self, base_retry_delay: Duration) -> Self {
        self.base_retry_delay = base_retry_delay;
        self
    }

    /// Set the backoff delay cap
    pub fn with_max_retry_delay(mut self, max_retry_delay: Duration) -> Self {
        self.max_retry_delay = max_retry_delay;
        self
    }

    /// Enable or disable rate limiting
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.enable_rate_limiting = enabled;
        self
    }

    /// Set the admission budget per window
    pub fn with_max_requests_per_window(mut self, max_requests: usize) -> Self {
        self.max_requests_per_window = max_requests;
        self
    }

    /// Set the sliding window length
    pub fn with_rate_limit_window(mut self, window: Duration) -> Self {
        self.rate_limit_window = window;
        self
    }

    /// Set the maximum accepted prompt length in characters
    pub fn with_max_prompt_length(mut self, max_prompt_length: usize) -> Self {
        self.max_prompt_length = max_prompt_length;
        self
    }
}

/// Outcome of a single executed operation.
///
/// Exactly one of `data` and `error` is populated. `timestamp` is taken at
/// construction, `duration` covers validation through completion.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClassifiedError>,
    pub operation_name: String,
    pub provider_name: String,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl<T> OperationResult<T> {
    /// Create a success result
    pub fn success(
        data: T,
        operation_name: impl Into<String>,
        provider_name: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            operation_name: operation_name.into(),
            provider_name: provider_name.into(),
            duration,
            timestamp: Utc::now(),
        }
    }

    /// Create a failure result
    pub fn failure(
        error: ClassifiedError,
        operation_name: impl Into<String>,
        provider_name: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            operation_name: operation_name.into(),
            provider_name: provider_name.into(),
            duration,
            timestamp: Utc::now(),
        }
    }

    /// Convert into a plain `Result`, discarding the envelope
    pub fn into_result(self) -> Result<T, ClassifiedError> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err(ClassifiedError::new(
                "operation produced neither data nor error",
                crate::error::ErrorKind::UnknownError,
                false,
            )),
        }
    }
}

/// Snapshot of retry and rate-limit accounting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationStatistics {
    pub total_retries: u64,
    pub operations_with_retries: usize,
    pub active_rate_limit_keys: usize,
    pub retry_count_by_operation: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_provider_kind_parses_aliases() {
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("LMStudio".parse::<ProviderKind>().unwrap(), ProviderKind::LmStudio);
        assert_eq!("lm-studio".parse::<ProviderKind>().unwrap(), ProviderKind::LmStudio);
        assert_eq!("open-webui".parse::<ProviderKind>().unwrap(), ProviderKind::OpenWebUi);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("DeepSeek".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
    }

    #[test]
    fn test_unknown_provider_kind_is_a_configuration_error() {
        let err = "grok".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_configuration_defaults() {
        let config = OperationConfiguration::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_retry_delay, Duration::from_millis(1000));
        assert_eq!(config.max_retry_delay, Duration::from_millis(30_000));
        assert!(config.enable_rate_limiting);
        assert_eq!(config.max_requests_per_window, 60);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.max_prompt_length, 100_000);
    }

    #[test]
    fn test_result_populates_exactly_one_side() {
        let ok = OperationResult::success("hi", "generate", "ollama", Duration::ZERO);
        assert!(ok.success);
        assert!(ok.data.is_some());
        assert!(ok.error.is_none());

        let err = OperationResult::<String>::failure(
            ClassifiedError::new("boom", ErrorKind::UnknownError, false),
            "generate",
            "ollama",
            Duration::ZERO,
        );
        assert!(!err.success);
        assert!(err.data.is_none());
        assert!(err.error.is_some());
    }

    #[test]
    fn test_result_timestamp_is_recent_utc() {
        let before = Utc::now();
        let result = OperationResult::success((), "generate", "ollama", Duration::ZERO);
        let after = Utc::now();
        assert!(result.timestamp >= before && result.timestamp <= after);
    }

    #[test]
    fn test_context_builder_round_trip() {
        let ctx = OperationContext::new()
            .with_api_key_id("key-17")
            .with_max_tokens(256)
            .with_timeout_ms(30_000)
            .with_prompt("hello");
        assert!(!ctx.request_id.is_empty());
        assert_eq!(ctx.api_key_id.as_deref(), Some("key-17"));
        assert_eq!(ctx.max_tokens, Some(256));
        assert_eq!(ctx.timeout_ms, Some(30_000));
        assert_eq!(ctx.prompt.as_deref(), Some("hello"));
    }

    #[test]
    fn test_identity_tracks_current_model() {
        let identity = ProviderIdentity::new(
            ProviderKind::Ollama,
            "Ollama",
            "http://localhost:11434",
            "llama3",
        );
        assert_eq!(identity.current_model, "llama3");

        let identity = identity.with_model("mistral");
        assert_eq!(identity.default_model, "llama3");
        assert_eq!(identity.current_model, "mistral");
    }
}
