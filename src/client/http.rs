//! HTTP Handle
//!
//! Reqwest-backed [`ContentHandle`] issuing Gemini-style
//! `models/{model}:generateContent` calls for one credential and model.

use crate::api::{GenerateContentRequest, GenerateContentResponse, Prompt};
use crate::client::ContentHandle;
use crate::error::CallError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTP handle bound to one API key and one model.
pub struct HttpHandle {
    /// Inner reqwest client
    client: Client,

    /// API key used to authenticate calls
    api_key: String,

    /// Fully qualified endpoint URL (base + model + :generateContent)
    url: String,
}

impl HttpHandle {
    /// Create a handle for the given key and model.
    ///
    /// `request_timeout` bounds each attempt end to end so a hung provider
    /// call cannot block the router indefinitely.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> std::result::Result<Self, CallError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| CallError::new(None, format!("Failed to create HTTP client: {}", e)))?;

        let url = format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            url,
        })
    }

    /// Endpoint URL this handle posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContentHandle for HttpHandle {
    async fn generate(&self, prompt: &Prompt) -> std::result::Result<String, CallError> {
        let body = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(CallError::from)?;

        let status = response.status();
        let text = response.text().await.map_err(CallError::from)?;

        if !status.is_success() {
            // Prefer the provider's structured error message when the body
            // parses; fall back to the raw (truncated) body.
            let message = extract_error_message(&text)
                .unwrap_or_else(|| truncate_body(&text, 500).to_string());
            return Err(CallError::new(Some(status.as_u16()), message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            CallError::new(
                None,
                format!(
                    "Failed to parse response: {}. Body: {}",
                    e,
                    truncate_body(&text, 500)
                ),
            )
        })?;

        parsed
            .text()
            .ok_or_else(|| CallError::new(None, "Response contained no text candidates"))
    }
}

/// Truncate a response body to at most `max` bytes without splitting a
/// multi-byte UTF-8 character.
fn truncate_body(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }

    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Pull `error.status` and `error.message` out of a provider error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;

    let message = error.get("message").and_then(|m| m.as_str());
    let status = error.get("status").and_then(|s| s.as_str());

    match (status, message) {
        (Some(s), Some(m)) => Some(format!("{}: {}", s, m)),
        (None, Some(m)) => Some(m.to_string()),
        (Some(s), None) => Some(s.to_string()),
        (None, None) => None,
    }
}
