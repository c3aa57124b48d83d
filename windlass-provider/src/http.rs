//! Shared HTTP error mapping for the REST-backed providers.

use reqwest::{Response, StatusCode};
use windlass_core::error::ProviderError;

/// Turn a non-success response into a typed provider error.
///
/// Consumes the response body; call only after checking the status.
pub(crate) async fn error_for_status(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, &body)
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = extract_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::authentication(message)
        }
        StatusCode::NOT_FOUND => ProviderError::model_not_available(message),
        StatusCode::TOO_MANY_REQUESTS => {
            let lowered = message.to_lowercase();
            if lowered.contains("quota") || lowered.contains("billing") {
                ProviderError::insufficient_quota(message)
            } else {
                ProviderError::rate_limited(message)
            }
        }
        _ => ProviderError::api(status.as_u16(), message),
    }
}

/// Pull a human-readable message out of a JSON error body.
///
/// Handles both `{"error": "..."}` (Ollama) and
/// `{"error": {"message": "..."}}` (OpenAI-compatible, Anthropic).
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    if let Some(text) = error.as_str() {
        return Some(text.to_string());
    }
    error.get("message")?.as_str().map(str::to_string)
}
