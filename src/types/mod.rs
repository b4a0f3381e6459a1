pub mod error;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, QuotaDocError, Result};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stable identifier of a work item: the source path relative to the
/// scanned root, always `/`-separated.
///
/// Used as the idempotency key against the completed set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an id from a path relative to the source root
    pub fn from_relative_path(path: &Path) -> Self {
        let joined = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One candidate source file for the batch.
///
/// Constructed transiently per run; never persisted beyond its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: ItemId,
    /// Location on disk used to read the content
    pub path: PathBuf,
}

impl WorkItem {
    pub fn new(id: impl Into<ItemId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_from_relative_path() {
        let id = ItemId::from_relative_path(Path::new("src").join("ai").join("mod.rs").as_path());
        assert_eq!(id.as_str(), "src/ai/mod.rs");
    }

    #[test]
    fn test_item_id_serializes_as_string() {
        let id = ItemId::new("src/lib.rs");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"src/lib.rs\"");
    }
}
