//! Client Module
//!
//! The provider seam: an object-safe async trait the router calls through,
//! and the reqwest-backed implementation.

pub mod http;

pub use http::HttpHandle;

use crate::api::Prompt;
use crate::error::CallError;
use async_trait::async_trait;

/// Request mode a handle was initialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Text-only generation
    Text,

    /// Text plus inline image generation
    Vision,
}

/// An initialized client capable of issuing one generate-content call.
///
/// The router owns one boxed handle per (credential, mode) and never talks to
/// the provider directly; tests substitute scripted implementations.
#[async_trait]
pub trait ContentHandle: Send + Sync {
    /// Issue a single generate-content call and return the extracted text.
    async fn generate(&self, prompt: &Prompt) -> std::result::Result<String, CallError>;
}
