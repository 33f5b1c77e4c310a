//! Credentials and Usage Tracking
//!
//! One configured API key with independently-initialized text/vision handles
//! and per-key usage statistics, including the quota-exceeded flag with its
//! lazy 24h expiry.

use crate::client::{ContentHandle, Mode};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Quota-exceeded flags auto-clear after this window (24h), checked lazily on
/// the next selection attempt for the credential.
pub const QUOTA_RESET_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Mutable usage state attached 1:1 to a credential.
///
/// Counters are relaxed atomics: they are diagnostics, not a strict
/// accounting identity, and may be approximate under concurrent callers.
#[derive(Debug, Default)]
pub struct UsageStats {
    /// Total attempts routed through this credential
    request_count: AtomicU64,

    /// Attempts that returned text
    success_count: AtomicU64,

    /// Attempts that failed
    error_count: AtomicU64,

    /// Epoch-millis of the last attempt, if any
    last_used_ms: RwLock<Option<i64>>,

    /// Set when a quota error was classified for this credential
    quota_exceeded: AtomicBool,

    /// Epoch-millis when the quota window is considered over
    quota_reset_ms: RwLock<Option<i64>>,
}

impl UsageStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of an attempt.
    pub fn record_attempt(&self, now_ms: i64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        *self.last_used_ms.write() = Some(now_ms);
    }

    /// Record a successful attempt.
    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed attempt.
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark this credential quota-exceeded for the full reset window.
    pub fn mark_quota_exceeded(&self, now_ms: i64) {
        self.quota_exceeded.store(true, Ordering::Relaxed);
        *self.quota_reset_ms.write() = Some(now_ms + QUOTA_RESET_WINDOW_MS);
    }

    /// Whether this credential is currently quota-limited.
    ///
    /// Clears the flag in place when the reset window has elapsed, so an
    /// expired quota mark never blocks a selection attempt.
    pub fn is_quota_limited(&self, now_ms: i64) -> bool {
        if !self.quota_exceeded.load(Ordering::Relaxed) {
            return false;
        }

        let elapsed = self.quota_reset_ms.read().map_or(true, |reset| now_ms >= reset);
        if elapsed {
            self.quota_exceeded.store(false, Ordering::Relaxed);
            *self.quota_reset_ms.write() = None;
            return false;
        }

        true
    }

    /// Total attempts routed through this credential.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Successful attempts.
    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    /// Failed attempts.
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of the stats.
    pub fn snapshot(&self) -> UsageSnapshot {
        let request_count = self.request_count();
        let success_count = self.success_count();

        UsageSnapshot {
            request_count,
            success_count,
            error_count: self.error_count(),
            success_rate: if request_count == 0 {
                0.0
            } else {
                success_count as f64 / request_count as f64
            },
            last_used_ms: *self.last_used_ms.read(),
            quota_exceeded: self.quota_exceeded.load(Ordering::Relaxed),
            quota_reset_ms: *self.quota_reset_ms.read(),
        }
    }
}

/// Serializable snapshot of a credential's usage stats.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    /// Total attempts
    pub request_count: u64,

    /// Successful attempts
    pub success_count: u64,

    /// Failed attempts
    pub error_count: u64,

    /// success_count / request_count, 0.0 when no requests were made
    pub success_rate: f64,

    /// Epoch-millis of the last attempt
    pub last_used_ms: Option<i64>,

    /// Currently quota-limited
    pub quota_exceeded: bool,

    /// Epoch-millis when the quota window ends
    pub quota_reset_ms: Option<i64>,
}

/// One configured API key with its initialized request handles.
///
/// Handles are built once at startup; a credential whose handle construction
/// failed for a mode is retained in the pool and skipped at call time.
pub struct Credential {
    /// Raw secret
    key: String,

    /// Position in the configured list
    index: usize,

    /// Text-capable handle, if initialization succeeded
    text_handle: Option<Box<dyn ContentHandle>>,

    /// Vision-capable handle, if initialization succeeded
    vision_handle: Option<Box<dyn ContentHandle>>,

    /// Usage statistics
    stats: UsageStats,
}

impl Credential {
    /// Create a credential from a key and its initialized handles.
    pub fn new(
        index: usize,
        key: impl Into<String>,
        text_handle: Option<Box<dyn ContentHandle>>,
        vision_handle: Option<Box<dyn ContentHandle>>,
    ) -> Self {
        Self {
            key: key.into(),
            index,
            text_handle,
            vision_handle,
            stats: UsageStats::new(),
        }
    }

    /// Position in the configured list (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Masked preview of the secret, safe for logs and status output.
    pub fn key_preview(&self) -> String {
        let prefix: String = self.key.chars().take(8).collect();
        format!("{}...", prefix)
    }

    /// The handle for the requested mode, if one was initialized.
    pub fn handle(&self, mode: Mode) -> Option<&dyn ContentHandle> {
        match mode {
            Mode::Text => self.text_handle.as_deref(),
            Mode::Vision => self.vision_handle.as_deref(),
        }
    }

    /// Whether a handle exists for the requested mode.
    pub fn has_handle(&self, mode: Mode) -> bool {
        self.handle(mode).is_some()
    }

    /// This credential's usage stats.
    pub fn stats(&self) -> &UsageStats {
        &self.stats
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("index", &self.index)
            .field("key", &self.key_preview())
            .field("has_text", &self.text_handle.is_some())
            .field("has_vision", &self.vision_handle.is_some())
            .finish()
    }
}
