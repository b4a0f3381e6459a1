//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! HTTP outcomes from the generation API are classified into categories so the
//! client can tell a quota signal apart from everything else:
//!
//! - **QuotaExceeded**: the credential hit its request quota (rotate)
//! - **Auth**: key rejected (surfaced as a transient per-item error)
//! - **Transient**: server-side trouble that may resolve on a later run
//! - **Unavailable**: endpoint or model missing
//!
//! Per-item errors never abort a run; they are converted into skip decisions
//! at the batch runner boundary.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories for classifying generation API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Quota or rate limit reached for the active credential
    QuotaExceeded,
    /// Authentication failed
    Auth,
    /// Invalid request
    BadRequest,
    /// Temporary server issues
    Transient,
    /// Endpoint or model not available
    Unavailable,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded => write!(f, "QUOTA_EXCEEDED"),
            Self::Auth => write!(f, "AUTH"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether this category means the current credential is spent
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Classified generation API error
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    /// Provider that produced the error
    pub provider: String,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.category, self.message)
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: provider.into(),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Status string some providers put in the error body when a quota is spent
const QUOTA_STATUS: &str = "RESOURCE_EXHAUSTED";

/// Error classifier for generation API responses
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code, consulting the provider status string
    /// from the error body when one was returned.
    pub fn classify_http_status(
        status: u16,
        provider_status: Option<&str>,
        message: &str,
        provider: &str,
    ) -> LlmError {
        if provider_status.is_some_and(|s| s.eq_ignore_ascii_case(QUOTA_STATUS)) {
            return LlmError::new(ErrorCategory::QuotaExceeded, message, provider);
        }

        let category = match status {
            429 => ErrorCategory::QuotaExceeded,
            401 | 403 => ErrorCategory::Auth,
            400 => ErrorCategory::BadRequest,
            500 | 502 | 503 | 504 => ErrorCategory::Transient,
            404 => ErrorCategory::Unavailable,
            _ => ErrorCategory::Unknown,
        };
        LlmError::new(category, message, provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum QuotaDocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error(
        "No API credentials configured: set llm.api_keys, QUOTADOC_API_KEYS or GEMINI_API_KEY"
    )]
    NoCredentials,

    // -------------------------------------------------------------------------
    // Run Errors
    // -------------------------------------------------------------------------
    #[error("Generation API error: {0}")]
    Llm(LlmError),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Per-Item Errors
    // -------------------------------------------------------------------------
    #[error("Cannot read {path}: {message}")]
    ItemRead { path: String, message: String },

    #[error("Parse error in {path}: {message}")]
    Parse { message: String, path: String },

    #[error("Failed to store documentation for {item}: {reason}")]
    Sink { item: String, reason: String },
}

impl From<LlmError> for QuotaDocError {
    fn from(err: LlmError) -> Self {
        QuotaDocError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, QuotaDocError>;

impl QuotaDocError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn item_read(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ItemRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn sink(item: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Sink {
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::QuotaExceeded.to_string(), "QUOTA_EXCEEDED");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::Transient.to_string(), "TRANSIENT");
    }

    #[test]
    fn test_classify_http_status() {
        let quota = ErrorClassifier::classify_http_status(429, None, "Too many", "gemini");
        assert_eq!(quota.category, ErrorCategory::QuotaExceeded);
        assert!(quota.category.is_quota());

        let auth = ErrorClassifier::classify_http_status(403, None, "Forbidden", "gemini");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server = ErrorClassifier::classify_http_status(503, None, "Overloaded", "gemini");
        assert_eq!(server.category, ErrorCategory::Transient);
        assert!(!server.category.is_quota());

        let missing = ErrorClassifier::classify_http_status(404, None, "No model", "gemini");
        assert_eq!(missing.category, ErrorCategory::Unavailable);
    }

    #[test]
    fn test_classify_provider_quota_status() {
        // Some deployments report quota exhaustion with a 403 plus status string
        let err = ErrorClassifier::classify_http_status(
            403,
            Some("RESOURCE_EXHAUSTED"),
            "Quota exceeded",
            "gemini",
        );
        assert_eq!(err.category, ErrorCategory::QuotaExceeded);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::new(ErrorCategory::QuotaExceeded, "Too many requests", "gemini");
        assert_eq!(err.to_string(), "[gemini:QUOTA_EXCEEDED] Too many requests");
    }
}
