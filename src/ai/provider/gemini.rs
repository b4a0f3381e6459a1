//! Gemini API Client
//!
//! Calls `models/{model}:generateContent` with the credential in the
//! `x-goog-api-key` header and classifies the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{GenerationClient, GenerationOutcome};
use crate::ai::credentials::Credential;
use crate::ai::prompt::RequestPayload;
use crate::ai::timeout::with_timeout;
use crate::config::LlmConfig;
use crate::constants::network;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, QuotaDocError, Result};

const PROVIDER: &str = "gemini";

pub struct GeminiClient {
    api_base: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| QuotaDocError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    /// Raw HTTP exchange: status and body text
    async fn send(&self, payload: &RequestPayload, credential: &Credential) -> Result<(u16, String)> {
        let request = self.build_request(&payload.prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential.expose())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(format!("request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(format!("failed to read body: {}", e)))?;
        Ok((status, body))
    }
}

fn transport_error(message: String) -> QuotaDocError {
    LlmError::new(ErrorCategory::Transient, message, PROVIDER).into()
}

#[async_trait]
impl GenerationClient for GeminiClient {
    #[instrument(skip_all, fields(item = %payload.id, key = %credential.label()))]
    async fn submit(&self, payload: &RequestPayload, credential: &Credential) -> GenerationOutcome {
        debug!(
            "Sending {} chars to {} ({})",
            payload.prompt.len(),
            self.model,
            PROVIDER
        );

        match with_timeout(self.timeout, self.send(payload, credential), "generateContent").await {
            Ok((status, body)) => classify_response(status, &body),
            Err(e) => GenerationOutcome::TransientError(e.to_string()),
        }
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map an HTTP status and body onto an outcome
pub fn classify_response(status: u16, body: &str) -> GenerationOutcome {
    if (200..300).contains(&status) {
        let parsed: GenerateContentResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return GenerationOutcome::TransientError(format!(
                    "undecodable response: {}",
                    e
                ));
            }
        };

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        return if text.trim().is_empty() {
            GenerationOutcome::Empty
        } else {
            GenerationOutcome::Produced(text)
        };
    }

    let api_error = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);
    let message = api_error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));
    let provider_status = api_error.as_ref().and_then(|e| e.status.as_deref());

    let error = ErrorClassifier::classify_http_status(status, provider_status, &message, PROVIDER);
    if error.category.is_quota() {
        GenerationOutcome::QuotaExhausted
    } else {
        GenerationOutcome::TransientError(error.to_string())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}
