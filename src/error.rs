//! Keyfan Error Types
//!
//! The router never surfaces a raw provider failure to its callers: every
//! `generate` call either returns text or one aggregated [`RouterError`]
//! summarizing the failure classes seen across the attempted credentials.

use thiserror::Error;

/// Aggregated error surfaced to callers of the router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Configuration errors (no usable keys, unreadable config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every credential in the pool is currently quota-limited.
    #[error("All {total_keys} API keys have exceeded their quota. Try again after the quota window resets.")]
    AllQuotaExceeded {
        /// Total number of credentials in the pool
        total_keys: usize,
    },

    /// The provider reported overload/unavailable for every attempted credential.
    #[error("The AI service is overloaded on all keys. Retry shortly.")]
    AllOverloaded,

    /// Every attempted credential was rejected as an invalid key.
    #[error("All configured API keys were rejected as invalid. Check your key configuration.")]
    AllKeysInvalid,

    /// Some credentials hit quota limits, but the pool still has working keys.
    #[error("Quota exceeded on some keys ({working_keys} still usable); the request failed and may be retried.")]
    PartialQuotaExceeded {
        /// Credentials not currently quota-limited
        working_keys: usize,
    },

    /// Some credentials hit overload errors, but not all of them.
    #[error("The AI service reported overload on some keys; the request failed and may be retried.")]
    PartialOverload,

    /// Mixed or unclassified failures; wraps the last underlying error message.
    #[error("AI service temporarily unavailable: {last_error}")]
    Unavailable {
        /// Message of the last provider failure observed
        last_error: String,
    },

    /// The attempt loop never reached a usable credential (e.g. the requested
    /// mode has no initialized handle on any key).
    #[error("No valid credentials available for this request mode")]
    NoValidCredentials,
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::Config(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for RouterError {
    fn from(err: std::io::Error) -> Self {
        RouterError::Config(format!("IO error: {}", err))
    }
}

/// A single failed provider call, before classification.
///
/// Carries the HTTP status when one was observed so classification can match
/// on structured codes first and fall back to message substrings.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CallError {
    /// HTTP status code, if the failure came from a non-2xx response
    pub status: Option<u16>,

    /// Human-readable provider error message
    pub message: String,
}

impl CallError {
    /// Create a call error from an optional status code and a message.
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timeout: {}", err)
        } else if err.is_connect() {
            format!("Connection failed: {}", err)
        } else if err.is_decode() {
            format!("Failed to decode response: {}", err)
        } else {
            err.to_string()
        };

        Self {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

/// Result type alias for keyfan operations
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_error_messages() {
        let err = RouterError::AllQuotaExceeded { total_keys: 3 };
        assert!(err.to_string().contains("All 3 API keys"));

        let err = RouterError::PartialQuotaExceeded { working_keys: 2 };
        assert!(err.to_string().contains("2 still usable"));

        let err = RouterError::Unavailable {
            last_error: "boom".to_string(),
        };
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_call_error_display() {
        let err = CallError::new(Some(503), "The model is overloaded");
        assert_eq!(err.to_string(), "The model is overloaded");
        assert_eq!(err.status, Some(503));
    }
}
