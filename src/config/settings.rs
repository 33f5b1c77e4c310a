//! Router Settings
//!
//! The configuration schema for the key pool and provider endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_text_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_vision_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Configuration for the AI request router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Ordered API keys; empty and whitespace-only entries are dropped
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Base URL of the generate-content API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for text-only requests
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model used for text+image requests
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: default_base_url(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl RouterConfig {
    /// Configured keys with empty and whitespace-only entries removed,
    /// preserving order and dropping duplicates.
    pub fn sanitized_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for key in &self.api_keys {
            let trimmed = key.trim();
            if !trimmed.is_empty() && !keys.iter().any(|k| k == trimmed) {
                keys.push(trimmed.to_string());
            }
        }
        keys
    }

    /// Per-attempt request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: RouterConfig = serde_json::from_str(r#"{"api_keys": ["k1"]}"#).unwrap();
        assert_eq!(config.api_keys, vec!["k1"]);
        assert_eq!(config.text_model, "gemini-1.5-flash");
        assert_eq!(config.request_timeout_secs, 120);
        assert!(config.base_url.starts_with("https://"));
    }

    #[test]
    fn test_sanitized_keys_drops_blank_and_duplicate_entries() {
        let config = RouterConfig {
            api_keys: vec![
                "k1".to_string(),
                "".to_string(),
                "  ".to_string(),
                " k2 ".to_string(),
                "k1".to_string(),
            ],
            ..Default::default()
        };

        assert_eq!(config.sanitized_keys(), vec!["k1", "k2"]);
    }
}
