//! Key Pool
//!
//! The router core: scans credentials round-robin from the last successful
//! index, classifies failures, applies the backoff policy, and synthesizes a
//! single aggregated error when every attempt is exhausted.

use crate::api::{Prompt, PromptPart};
use crate::client::Mode;
use crate::error::{CallError, Result, RouterError};
use crate::router::classify::FailureKind;
use crate::router::credential::{Credential, UsageSnapshot};
use backoff::ExponentialBackoff;
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed delay applied after a rate-limit classification.
const RATE_LIMIT_DELAY: Duration = Duration::from_millis(2000);

/// Minimal prompt used by the key probes.
const PROBE_PROMPT: &str = "ping";

/// Backoff policy for overloaded-provider retries.
fn overload_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(2000),
        max_interval: Duration::from_secs(30),
        multiplier: 2.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Sleep duration before the attempt following an overload failure at the
/// given 0-based attempt index: `initial * 2^attempt`, capped at the policy
/// maximum.
pub(crate) fn overload_delay(attempt: u32) -> Duration {
    let policy = overload_policy();
    let factor = 2u32.saturating_pow(attempt.min(16));
    (policy.initial_interval * factor).min(policy.max_interval)
}

/// Pool of credentials with round-robin failover.
pub struct KeyPool {
    /// Configured credentials, in order
    credentials: Vec<Credential>,

    /// Index of the most recently successful credential; the next call
    /// starts its scan here
    current_index: AtomicUsize,
}

impl KeyPool {
    /// Create a pool. Fails fast when no credentials are configured.
    pub fn new(credentials: Vec<Credential>) -> Result<Self> {
        if credentials.is_empty() {
            return Err(RouterError::Config(
                "No valid API keys configured; the router cannot start".to_string(),
            ));
        }

        Ok(Self {
            credentials,
            current_index: AtomicUsize::new(0),
        })
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether the pool holds no credentials (never true after construction).
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Generate content, rotating across credentials on failure.
    ///
    /// `max_attempts` defaults to the pool size: one attempt per credential.
    /// Returns the extracted text on the first success, or one aggregated
    /// [`RouterError`] once every attempt is exhausted.
    pub async fn generate(
        &self,
        prompt: &Prompt,
        max_attempts: Option<usize>,
        mode: Mode,
    ) -> Result<String> {
        let pool_size = self.credentials.len();
        let max_attempts = max_attempts.unwrap_or(pool_size);
        let start = self.current_index.load(Ordering::Relaxed);

        let mut quota_hits: Vec<usize> = Vec::new();
        let mut overload_hits: Vec<usize> = Vec::new();
        let mut invalid_hits: Vec<usize> = Vec::new();
        let mut last_error: Option<CallError> = None;

        for attempt in 0..max_attempts {
            let index = (start + attempt) % pool_size;
            let credential = &self.credentials[index];

            let Some(handle) = credential.handle(mode) else {
                debug!(
                    key = %credential.key_preview(),
                    ?mode,
                    "skipping credential without a handle for this mode"
                );
                continue;
            };

            let now_ms = Utc::now().timestamp_millis();
            if credential.stats().is_quota_limited(now_ms) {
                debug!(
                    key = %credential.key_preview(),
                    "skipping quota-limited credential"
                );
                continue;
            }

            credential.stats().record_attempt(now_ms);

            match handle.generate(prompt).await {
                Ok(text) => {
                    self.current_index.store(index, Ordering::Relaxed);
                    credential.stats().record_success();
                    debug!(key = %credential.key_preview(), attempt, "generation succeeded");
                    return Ok(text);
                }
                Err(error) => {
                    credential.stats().record_error();
                    let kind = FailureKind::classify(&error);
                    warn!(
                        key = %credential.key_preview(),
                        attempt,
                        ?kind,
                        "generation attempt failed: {error}"
                    );

                    match kind {
                        FailureKind::Quota => {
                            credential.stats().mark_quota_exceeded(now_ms);
                            quota_hits.push(index);
                        }
                        FailureKind::Overloaded => {
                            overload_hits.push(index);
                            tokio::time::sleep(overload_delay(attempt as u32)).await;
                        }
                        FailureKind::InvalidKey => {
                            invalid_hits.push(index);
                        }
                        FailureKind::RateLimited => {
                            tokio::time::sleep(RATE_LIMIT_DELAY).await;
                        }
                        FailureKind::Other => {}
                    }

                    last_error = Some(error);
                }
            }
        }

        Err(self.aggregate(&quota_hits, &overload_hits, &invalid_hits, last_error))
    }

    /// Synthesize the aggregated failure after all attempts were exhausted.
    fn aggregate(
        &self,
        quota_hits: &[usize],
        overload_hits: &[usize],
        invalid_hits: &[usize],
        last_error: Option<CallError>,
    ) -> RouterError {
        let pool_size = self.credentials.len();

        if !quota_hits.is_empty() && quota_hits.len() == pool_size {
            RouterError::AllQuotaExceeded {
                total_keys: pool_size,
            }
        } else if !overload_hits.is_empty() && overload_hits.len() == pool_size {
            RouterError::AllOverloaded
        } else if !invalid_hits.is_empty() && invalid_hits.len() == pool_size {
            RouterError::AllKeysInvalid
        } else if !quota_hits.is_empty() {
            RouterError::PartialQuotaExceeded {
                working_keys: pool_size - quota_hits.len(),
            }
        } else if !overload_hits.is_empty() {
            RouterError::PartialOverload
        } else if let Some(error) = last_error {
            RouterError::Unavailable {
                last_error: error.to_string(),
            }
        } else {
            RouterError::NoValidCredentials
        }
    }

    /// Point-in-time snapshot of the pool for diagnostics.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            total_keys: self.credentials.len(),
            current_index: self.current_index.load(Ordering::Relaxed) + 1,
            keys: self
                .credentials
                .iter()
                .map(|c| KeyStatus {
                    index: c.index() + 1,
                    key_preview: c.key_preview(),
                    has_text: c.has_handle(Mode::Text),
                    has_vision: c.has_handle(Mode::Vision),
                    stats: c.stats().snapshot(),
                })
                .collect(),
        }
    }

    /// Per-credential usage stats with derived success rates.
    pub fn usage_stats(&self) -> Vec<UsageSnapshot> {
        self.credentials
            .iter()
            .map(|c| c.stats().snapshot())
            .collect()
    }

    /// Probe every credential with one minimal text call and one minimal
    /// vision call, independent of rotation, backoff, and quota flags.
    ///
    /// Probes are side-effect-free: usage counters and quota state are not
    /// touched, so diagnostics never skew production accounting.
    pub async fn test_all_keys(&self) -> Vec<ProbeResult> {
        let probes = self.credentials.iter().map(|credential| async move {
            let text_prompt = Prompt::text(PROBE_PROMPT);
            let vision_prompt = Prompt::Parts(vec![PromptPart::Text(PROBE_PROMPT.to_string())]);

            let text = match credential.handle(Mode::Text) {
                Some(handle) => match handle.generate(&text_prompt).await {
                    Ok(_) => ProbeOutcome::Ok,
                    Err(e) => ProbeOutcome::Failed {
                        error: e.to_string(),
                    },
                },
                None => ProbeOutcome::Unavailable,
            };

            let vision = match credential.handle(Mode::Vision) {
                Some(handle) => match handle.generate(&vision_prompt).await {
                    Ok(_) => ProbeOutcome::Ok,
                    Err(e) => ProbeOutcome::Failed {
                        error: e.to_string(),
                    },
                },
                None => ProbeOutcome::Unavailable,
            };

            ProbeResult {
                index: credential.index() + 1,
                key_preview: credential.key_preview(),
                text,
                vision,
            }
        });

        futures::future::join_all(probes).await
    }
}

/// Snapshot of the pool returned by [`KeyPool::status`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Number of configured credentials
    pub total_keys: usize,

    /// 1-based index of the most recently successful credential
    pub current_index: usize,

    /// Per-credential status
    pub keys: Vec<KeyStatus>,
}

/// Per-credential entry in a [`StatusSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct KeyStatus {
    /// 1-based position in the configured list
    pub index: usize,

    /// Masked secret preview
    pub key_preview: String,

    /// Text handle initialized
    pub has_text: bool,

    /// Vision handle initialized
    pub has_vision: bool,

    /// Usage stats snapshot
    pub stats: UsageSnapshot,
}

/// Result of probing one credential via [`KeyPool::test_all_keys`].
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// 1-based position in the configured list
    pub index: usize,

    /// Masked secret preview
    pub key_preview: String,

    /// Text probe outcome
    pub text: ProbeOutcome,

    /// Vision probe outcome
    pub vision: ProbeOutcome,
}

/// Outcome of a single probe call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The probe returned text
    Ok,

    /// The probe failed with the given provider error
    Failed {
        /// Provider error message
        error: String,
    },

    /// No handle is initialized for this mode
    Unavailable,
}
