//! Keyfan - Multi-Key Generative-AI Request Router
//!
//! Fans generate-content requests across several API keys, handling quota
//! exhaustion, transient overload, and invalid-key errors with per-key usage
//! state and retry/backoff policies.
//!
//! Construct one [`AiRouter`] at process startup and share it by reference:
//!
//! ```no_run
//! use keyfan::{AiRouter, RouterConfig};
//!
//! # async fn run() -> keyfan::Result<()> {
//! let config = RouterConfig {
//!     api_keys: vec!["key-1".into(), "key-2".into()],
//!     ..Default::default()
//! };
//! let router = AiRouter::from_config(config)?;
//! let answer = router.generate_text("Estimate the calories in a bowl of ramen").await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tracing::warn;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod router;

pub use api::{Prompt, PromptPart};
pub use client::{ContentHandle, HttpHandle, Mode};
pub use config::{ConfigLoader, RouterConfig};
pub use error::{CallError, Result, RouterError};
pub use router::{
    Credential, KeyPool, KeyStatus, ProbeOutcome, ProbeResult, StatusSnapshot, UsageSnapshot,
};

/// The AI request router: a credential pool plus its configuration.
///
/// Owns one [`KeyPool`] built from the configured keys. Callers hold the
/// router in their dependency graph; there is no process-global instance.
pub struct AiRouter {
    pool: KeyPool,
}

impl AiRouter {
    /// Build a router from config files and environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ConfigLoader::new()?.into_config())
    }

    /// Build a router from a specific config file (environment keys still apply).
    pub fn with_config_path(path: &str) -> Result<Self> {
        Self::from_config(ConfigLoader::from_path(path)?.into_config())
    }

    /// Build a router from an explicit configuration.
    ///
    /// Fails with [`RouterError::Config`] when no usable keys remain after
    /// filtering; a handle that fails to initialize for one mode is logged
    /// and that credential is skipped for the mode at call time.
    pub fn from_config(config: RouterConfig) -> Result<Self> {
        let keys = config.sanitized_keys();
        if keys.is_empty() {
            return Err(RouterError::Config(
                "No valid API keys configured; the router cannot start".to_string(),
            ));
        }

        let credentials = keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let text_handle = build_handle(
                    key,
                    &config.base_url,
                    &config.text_model,
                    config.request_timeout(),
                    config.connect_timeout(),
                    index,
                    Mode::Text,
                );
                let vision_handle = build_handle(
                    key,
                    &config.base_url,
                    &config.vision_model,
                    config.request_timeout(),
                    config.connect_timeout(),
                    index,
                    Mode::Vision,
                );

                Credential::new(index, key.clone(), text_handle, vision_handle)
            })
            .collect();

        Ok(Self {
            pool: KeyPool::new(credentials)?,
        })
    }

    /// Generate content for a text-only prompt.
    pub async fn generate_text(&self, prompt: impl Into<String>) -> Result<String> {
        self.pool
            .generate(&Prompt::Text(prompt.into()), None, Mode::Text)
            .await
    }

    /// Generate content for a prompt with inline images.
    pub async fn generate_with_images(&self, parts: Vec<PromptPart>) -> Result<String> {
        self.pool
            .generate(&Prompt::Parts(parts), None, Mode::Vision)
            .await
    }

    /// Generate content with full control over attempts and mode.
    pub async fn generate(
        &self,
        prompt: &Prompt,
        max_attempts: Option<usize>,
        use_vision: bool,
    ) -> Result<String> {
        let mode = if use_vision { Mode::Vision } else { Mode::Text };
        self.pool.generate(prompt, max_attempts, mode).await
    }

    /// Point-in-time pool status for diagnostics endpoints.
    pub fn status(&self) -> StatusSnapshot {
        self.pool.status()
    }

    /// Per-credential usage stats with derived success rates.
    pub fn usage_stats(&self) -> Vec<UsageSnapshot> {
        self.pool.usage_stats()
    }

    /// Probe every credential once per mode, without touching usage state.
    pub async fn test_all_keys(&self) -> Vec<ProbeResult> {
        self.pool.test_all_keys().await
    }

    /// The underlying key pool.
    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }
}

/// Build one HTTP handle, logging and returning `None` on failure so the
/// credential stays in the pool without that mode.
fn build_handle(
    key: &str,
    base_url: &str,
    model: &str,
    request_timeout: Duration,
    connect_timeout: Duration,
    index: usize,
    mode: Mode,
) -> Option<Box<dyn ContentHandle>> {
    match HttpHandle::new(key, base_url, model, request_timeout, connect_timeout) {
        Ok(handle) => Some(Box::new(handle)),
        Err(e) => {
            warn!(index, ?mode, "failed to initialize handle: {e}");
            None
        }
    }
}

/// Install a `tracing` subscriber reading the `RUST_LOG` filter.
///
/// Convenience for binaries embedding the router; safe to skip when the host
/// process installs its own subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_list_fails_construction() {
        let err = AiRouter::from_config(RouterConfig::default()).err().unwrap();
        assert!(matches!(err, RouterError::Config(_)));
    }

    #[test]
    fn test_blank_keys_are_filtered_before_construction() {
        let config = RouterConfig {
            api_keys: vec!["".to_string(), "   ".to_string()],
            ..Default::default()
        };

        let err = AiRouter::from_config(config).err().unwrap();
        assert!(matches!(err, RouterError::Config(_)));
    }

    #[test]
    fn test_construction_builds_both_handles_per_key() {
        let config = RouterConfig {
            api_keys: vec!["key-a".to_string(), "key-b".to_string()],
            ..Default::default()
        };

        let router = AiRouter::from_config(config).unwrap();
        let status = router.status();

        assert_eq!(status.total_keys, 2);
        assert_eq!(status.current_index, 1);
        for key in &status.keys {
            assert!(key.has_text);
            assert!(key.has_vision);
            assert_eq!(key.stats.request_count, 0);
        }
    }
}
