// Gemini completion client module
// Author: kelexine (https://github.com/kelexine)

mod client;
pub mod models;

pub use client::GeminiClient;

use crate::error::RelayError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Token counts reported by the upstream. Missing counts are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
    pub total: u32,
}

impl From<&models::UsageMetadata> for TokenUsage {
    fn from(usage: &models::UsageMetadata) -> Self {
        Self {
            input: usage.prompt_token_count.unwrap_or(0),
            output: usage.candidates_token_count.unwrap_or(0),
            total: usage.total_token_count.unwrap_or(0),
        }
    }
}

/// A successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Why a generation failed.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The upstream rate or usage limit was reached.
    #[error("quota exhausted: {message}")]
    QuotaExhausted {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any other upstream failure (network, malformed response, server error).
    #[error("generation failed: {0}")]
    Generation(String),
}

impl From<CompletionError> for RelayError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::QuotaExhausted {
                message,
                retry_after,
            } => RelayError::RateLimited {
                message,
                retry_after,
            },
            CompletionError::Generation(message) => RelayError::Generation(message),
        }
    }
}

/// Text generation capability the chat pipeline delegates to.
///
/// Implementations perform no retries; a single call maps to at most one
/// upstream request.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Completion, CompletionError>;

    /// Model identifier, used as a metrics label.
    fn model(&self) -> &str;
}
