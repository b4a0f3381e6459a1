//! Documentation Sink
//!
//! Where generated text goes once an item produces it. The default sink
//! mirrors the source tree under the output directory as Markdown files.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::storage::write_atomic;
use crate::types::{ItemId, QuotaDocError, Result};

/// Accepts generated documentation for an item
pub trait DocSink: Send + Sync {
    fn store(&self, id: &ItemId, text: &str) -> Result<()>;
}

/// Writes `<output_dir>/<id>.md`
#[derive(Debug, Clone)]
pub struct MarkdownSink {
    output_dir: PathBuf,
}

impl MarkdownSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target file for an item; ids that would escape the output directory
    /// are rejected
    pub fn path_for(&self, id: &ItemId) -> Result<PathBuf> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if id.as_str().is_empty() || escapes {
            return Err(QuotaDocError::sink(id.as_str(), "id is not a relative path"));
        }
        Ok(self.output_dir.join(format!("{}.md", id.as_str())))
    }
}

impl DocSink for MarkdownSink {
    fn store(&self, id: &ItemId, text: &str) -> Result<()> {
        let path = self.path_for(id)?;

        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == text) {
            debug!("Unchanged: {}", path.display());
            return Ok(());
        }

        write_atomic(&path, text.as_bytes()).map_err(|e| QuotaDocError::sink(id.as_str(), e))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_mirrors_tree() {
        let dir = TempDir::new().unwrap();
        let sink = MarkdownSink::new(dir.path().join("docs"));

        sink.store(&ItemId::new("src/lib.rs"), "# lib\n").unwrap();

        let written = std::fs::read_to_string(dir.path().join("docs/src/lib.rs.md")).unwrap();
        assert_eq!(written, "# lib\n");
    }

    #[test]
    fn test_identical_content_left_untouched() {
        let dir = TempDir::new().unwrap();
        let sink = MarkdownSink::new(dir.path());
        let id = ItemId::new("a.rs");

        sink.store(&id, "same").unwrap();
        let path = sink.path_for(&id).unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        sink.store(&id, "same").unwrap();
        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);

        sink.store(&id, "changed").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "changed");
    }

    #[test]
    fn test_rejects_escaping_ids() {
        let sink = MarkdownSink::new("docs");
        for bad in ["../etc/passwd", "/abs.rs", ""] {
            let err = sink.store(&ItemId::new(bad), "x").unwrap_err();
            assert!(matches!(err, QuotaDocError::Sink { .. }), "{}", bad);
        }
    }
}
