//! Failure Classification
//!
//! Maps a provider call failure to one of five classes that drive the
//! rotation/backoff policy. Structured status codes are checked before
//! message substrings; the first matching class wins.

use crate::error::CallError;

/// Failure class of a single provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The credential's allotted usage is exhausted for the current period
    Quota,

    /// Transient provider-side capacity exhaustion
    Overloaded,

    /// The key itself was rejected
    InvalidKey,

    /// Request-rate throttling (without a quota signal)
    RateLimited,

    /// Anything else
    Other,
}

impl FailureKind {
    /// Classify a provider failure.
    pub fn classify(error: &CallError) -> Self {
        let message = error.message.to_lowercase();

        if error.status == Some(429)
            || message.contains("quota")
            || message.contains("resource has been exhausted")
            || message.contains("resource_exhausted")
        {
            return FailureKind::Quota;
        }

        if error.status == Some(503)
            || message.contains("overloaded")
            || message.contains("service unavailable")
        {
            return FailureKind::Overloaded;
        }

        if message.contains("api_key_invalid") || message.contains("invalid api key") {
            return FailureKind::InvalidKey;
        }

        if message.contains("rate_limit")
            || message.contains("rate limit")
            || message.contains("too many requests")
        {
            return FailureKind::RateLimited;
        }

        FailureKind::Other
    }
}
