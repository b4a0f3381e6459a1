//! Generation API Abstraction
//!
//! Defines the `GenerationClient` trait: one call per work item, answered
//! with a `GenerationOutcome`. Clients never retry and never fail; every
//! problem is folded into an outcome the batch runner can act on.

mod gemini;

pub use gemini::{GeminiClient, classify_response};

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::credentials::Credential;
use crate::ai::prompt::RequestPayload;
use crate::config::LlmConfig;
use crate::types::{QuotaDocError, Result};

/// Result of one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Non-empty documentation text
    Produced(String),
    /// The credential's quota is spent; rotate before retrying
    QuotaExhausted,
    /// Call succeeded but returned no usable text
    Empty,
    /// Network, server, decode or timeout failure
    TransientError(String),
}

impl GenerationOutcome {
    /// Short tag for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Produced(_) => "produced",
            Self::QuotaExhausted => "quota_exhausted",
            Self::Empty => "empty",
            Self::TransientError(_) => "transient_error",
        }
    }
}

/// Shared client for the runner
pub type SharedClient = Arc<dyn GenerationClient>;

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Submit one prompt with the given credential
    async fn submit(&self, payload: &RequestPayload, credential: &Credential)
    -> GenerationOutcome;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a shared client from configuration
pub fn create_client(config: &LlmConfig) -> Result<SharedClient> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(config)?)),
        other => Err(QuotaDocError::Config(format!(
            "Unknown provider: {}. Supported: gemini",
            other
        ))),
    }
}
