//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Quota accounting constants
pub mod quota {
    /// Default number of API attempts allowed per UTC calendar day
    pub const DEFAULT_DAILY_CAP: u32 = 1500;

    /// Default consecutive failed attempts before an item is abandoned (0 = never)
    pub const DEFAULT_MAX_ITEM_FAILURES: u32 = 5;

    /// Default progress state file, relative to the working directory
    pub const DEFAULT_STATE_FILE: &str = ".quotadoc/progress.json";
}

/// Generation API constants
pub mod llm {
    /// Default provider name
    pub const DEFAULT_PROVIDER: &str = "gemini";

    /// Default model for documentation generation
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

    /// Default Gemini REST endpoint
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Environment variable holding a comma-separated key list
    pub const KEYS_ENV: &str = "QUOTADOC_API_KEYS";

    /// Single-key environment variable fallback
    pub const KEY_ENV: &str = "GEMINI_API_KEY";
}

/// File analysis constants
pub mod analysis {
    /// Maximum file size to consider (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Maximum characters of source embedded in a prompt
    pub const MAX_FILE_CHARS: usize = 30_000;

    /// Maximum outline entries rendered into a prompt
    pub const MAX_OUTLINE_ENTRIES: usize = 60;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
