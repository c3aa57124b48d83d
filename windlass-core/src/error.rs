//! Error taxonomy and classification for provider operations.

use serde::{Deserialize, Serialize};

/// Classification buckets for failed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownError,
    NetworkError,
    Timeout,
    AuthenticationError,
    ValidationError,
    ConfigurationError,
    RateLimitExceeded,
    ModelNotAvailable,
    InsufficientQuota,
}

/// The main error type for provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Backend returned a non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Rate limit errors reported by the backend
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested model is not served by the backend
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Account quota or billing exhausted
    #[error("Insufficient quota: {0}")]
    InsufficientQuota(String),

    /// Timeout errors
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The in-flight request was cancelled
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Domain error that already carries its own classification
    #[error("{message}")]
    Operation {
        message: String,
        kind: ErrorKind,
        retryable: bool,
    },

    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Create an API error carrying the HTTP status
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a model-not-available error
    pub fn model_not_available(msg: impl Into<String>) -> Self {
        Self::ModelNotAvailable(msg.into())
    }

    /// Create an insufficient quota error
    pub fn insufficient_quota(msg: impl Into<String>) -> Self {
        Self::InsufficientQuota(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a domain error with an explicit classification
    pub fn operation(msg: impl Into<String>, kind: ErrorKind, retryable: bool) -> Self {
        Self::Operation {
            message: msg.into(),
            kind,
            retryable,
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Classification bucket for this error
    pub fn kind(&self) -> ErrorKind {
        classify(self).0
    }

    /// Check if re-invoking the failed operation has a reasonable chance of succeeding
    pub fn is_retryable(&self) -> bool {
        classify(self).1
    }
}

impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ProviderError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// Map an error to its `(kind, retryable)` classification.
///
/// Anything unmatched falls through to `UnknownError` with `retryable =
/// false`, so unknown failure modes never feed a retry loop.
pub fn classify(error: &ProviderError) -> (ErrorKind, bool) {
    match error {
        ProviderError::Network(e) => {
            if e.is_timeout() {
                (ErrorKind::Timeout, true)
            } else if e.is_builder() {
                (ErrorKind::ConfigurationError, false)
            } else if e.is_decode() {
                (ErrorKind::UnknownError, false)
            } else {
                (ErrorKind::NetworkError, true)
            }
        }
        ProviderError::Api { status, .. } => match status {
            // Gateway failures are transient from the caller's side.
            502 | 503 | 504 => (ErrorKind::NetworkError, true),
            401 | 403 => (ErrorKind::AuthenticationError, false),
            408 => (ErrorKind::Timeout, true),
            429 => (ErrorKind::RateLimitExceeded, true),
            _ => (ErrorKind::UnknownError, false),
        },
        ProviderError::Timeout(_) | ProviderError::Cancelled(_) => (ErrorKind::Timeout, true),
        ProviderError::Operation {
            kind, retryable, ..
        } => (*kind, *retryable),
        ProviderError::Authentication(_) => (ErrorKind::AuthenticationError, false),
        ProviderError::InvalidRequest(_) => (ErrorKind::ValidationError, false),
        ProviderError::Configuration(_) => (ErrorKind::ConfigurationError, false),
        ProviderError::RateLimited(_) => (ErrorKind::RateLimitExceeded, true),
        ProviderError::ModelNotAvailable(_) => (ErrorKind::ModelNotAvailable, false),
        ProviderError::InsufficientQuota(_) => (ErrorKind::InsufficientQuota, false),
        ProviderError::Serialization(_) | ProviderError::Other(_) => {
            (ErrorKind::UnknownError, false)
        }
    }
}

/// Classified failure surfaced to callers.
///
/// `retryable` describes the terminal error itself, so callers can tell
/// "exhausted retries on a transient condition" apart from "permanently
/// failed".
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedError {
    pub message: String,
    pub kind: ErrorKind,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ClassifiedError {
    /// Create a classified error
    pub fn new(message: impl Into<String>, kind: ErrorKind, retryable: bool) -> Self {
        Self {
            message: message.into(),
            kind,
            retryable,
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClassifiedError {}

impl From<ProviderError> for ClassifiedError {
    fn from(error: ProviderError) -> Self {
        let (kind, retryable) = classify(&error);
        let cause = std::error::Error::source(&error).map(|source| source.to_string());
        Self {
            message: error.to_string(),
            kind,
            retryable,
            cause,
        }
    }
}
