//! Router Module
//!
//! Credential pool, failure classification, and the rotation/failover loop.

pub mod classify;
pub mod credential;
pub mod pool;

pub use classify::FailureKind;
pub use credential::{Credential, UsageSnapshot, UsageStats, QUOTA_RESET_WINDOW_MS};
pub use pool::{KeyPool, KeyStatus, ProbeOutcome, ProbeResult, StatusSnapshot};
