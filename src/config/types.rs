//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/quotadoc/) and project (.quotadoc/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{analysis, llm, network, quota};
use crate::types::{QuotaDocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Project-specific settings
    pub project: ProjectConfig,

    /// Source discovery settings
    pub analysis: AnalysisConfig,

    /// Documentation output settings
    pub documentation: DocumentationConfig,

    /// Generation API settings
    pub llm: LlmConfig,

    /// Quota and resume settings
    pub quota: QuotaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            project: ProjectConfig::default(),
            analysis: AnalysisConfig::default(),
            documentation: DocumentationConfig::default(),
            llm: LlmConfig::default(),
            quota: QuotaConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `QuotaDocError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(QuotaDocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(QuotaDocError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.quota.daily_cap == 0 {
            return Err(QuotaDocError::Config(
                "Quota daily_cap must be greater than 0".to_string(),
            ));
        }

        if self.analysis.max_file_chars == 0 {
            return Err(QuotaDocError::Config(
                "Analysis max_file_chars must be greater than 0".to_string(),
            ));
        }

        let url = url::Url::parse(&self.llm.api_base).map_err(|e| {
            QuotaDocError::Config(format!("Invalid api_base '{}': {}", self.llm.api_base, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(QuotaDocError::Config(format!(
                "api_base must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Project Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name (defaults to directory name)
    pub name: Option<String>,

    /// Root directory that is scanned for source files
    pub source_root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            source_root: PathBuf::from("."),
        }
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Glob patterns to include
    pub include: Vec<String>,

    /// Glob patterns to exclude
    pub exclude: Vec<String>,

    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Only consider files with a known source extension
    pub source_only: bool,

    /// Maximum characters of source embedded in each prompt
    pub max_file_chars: usize,

    /// Attach a tree-sitter outline to prompts when the language is supported
    pub outline: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*".to_string()],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/.git/**".to_string(),
                "**/target/**".to_string(),
                "**/vendor/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/.venv/**".to_string(),
                "**/build/**".to_string(),
                "**/.quotadoc/**".to_string(),
            ],
            max_file_size: analysis::MAX_FILE_SIZE,
            source_only: true,
            max_file_chars: analysis::MAX_FILE_CHARS,
            outline: true,
        }
    }
}

// =============================================================================
// Documentation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationConfig {
    /// Output directory for generated Markdown
    pub output_dir: PathBuf,
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".quotadoc/docs"),
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Generation API settings
///
/// API keys are never serialized back out (`config show` omits them) and are
/// redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Ordered credentials; rotation walks this list front to back
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_keys", &format!("[{} REDACTED]", self.api_keys.len()))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: llm::DEFAULT_PROVIDER.to_string(),
            model: llm::DEFAULT_MODEL.to_string(),
            api_base: llm::DEFAULT_API_BASE.to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.2,
            api_keys: Vec::new(),
        }
    }
}

// =============================================================================
// Quota Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// API attempts allowed per UTC calendar day
    pub daily_cap: u32,

    /// Consecutive failed attempts after which an item is abandoned (0 = never)
    pub max_item_failures: u32,

    /// Progress state file
    pub state_file: PathBuf,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_cap: quota::DEFAULT_DAILY_CAP,
            max_item_failures: quota::DEFAULT_MAX_ITEM_FAILURES,
            state_file: PathBuf::from(quota::DEFAULT_STATE_FILE),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
