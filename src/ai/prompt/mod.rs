//! Prompt Construction
//!
//! Turns one work item into the prompt sent to the generation API. Rendering
//! is deterministic: the same id, content and outline always produce the
//! same prompt, so a resumed run asks exactly the same question.

use std::path::Path;

use tracing::debug;

use crate::analyzer::parser::{StructureSummarizer, detect_language_or_text};
use crate::config::AnalysisConfig;
use crate::types::{ItemId, QuotaDocError, Result, WorkItem};

/// Marker appended when source content is cut to the character budget
pub const TRUNCATION_MARKER: &str = "[truncated]";

/// Prompt section types
#[derive(Debug, Clone)]
enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    Text { header: String, content: String },
    Code { language: String, content: String },
    Focus { target: String, restrictions: Vec<String> },
}

/// Ordered prompt sections rendered into a single string
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.to_string()).collect(),
        ));
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: header.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn focus(mut self, target: &str, restrictions: &[&str]) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Text { header, content } => {
                    prompt.push_str(&format!("# {}\n\n", header));
                    prompt.push_str(content.trim_end());
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    if !content.ends_with('\n') {
                        prompt.push('\n');
                    }
                    prompt.push_str("```\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Everything the generation API needs for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    pub id: ItemId,
    pub prompt: String,
}

/// Cut `content` to at most `max_chars` characters on a char boundary.
/// Returns the kept prefix and whether anything was dropped.
pub fn truncate_chars(content: &str, max_chars: usize) -> (&str, bool) {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&content[..byte_idx], true),
        None => (content, false),
    }
}

/// Render the documentation prompt for one file
pub fn render_prompt(id: &ItemId, content: &str, outline: Option<&str>, max_chars: usize) -> String {
    let (source, truncated) = truncate_chars(content, max_chars);
    let source = if truncated {
        format!("{}\n{}", source, TRUNCATION_MARKER)
    } else {
        source.to_string()
    };

    let mut builder = PromptBuilder::new()
        .role("code documentation assistant", "single-file reference docs")
        .objectives(&[
            "Explain WHAT this file does and WHY it exists",
            "Describe its public types and functions and how they are used",
            "Call out invariants, error handling and side effects",
            "Write GitHub-flavored Markdown starting with a level-1 heading",
        ])
        .focus(
            id.as_str(),
            &[
                "Do NOT speculate about code you cannot see",
                "ONLY document facts observable in the provided code",
            ],
        )
        .section("File", id.as_str());

    if let Some(outline) = outline.filter(|o| !o.trim().is_empty()) {
        builder = builder.section("Structure", outline);
    }

    builder
        .code(detect_language_or_text(Path::new(id.as_str())), &source)
        .build()
}

/// Reads items from disk and renders their prompts
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    max_chars: usize,
    summarizer: Option<StructureSummarizer>,
}

impl RequestBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            summarizer: None,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        let builder = Self::new(config.max_file_chars);
        if config.outline {
            builder.with_summarizer(StructureSummarizer::new())
        } else {
            builder
        }
    }

    pub fn with_summarizer(mut self, summarizer: StructureSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Read the item and render its prompt. Read and decode failures are
    /// per-item errors.
    pub fn build(&self, item: &WorkItem) -> Result<RequestPayload> {
        let bytes = std::fs::read(&item.path)
            .map_err(|e| QuotaDocError::item_read(item.path.display().to_string(), e))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| QuotaDocError::item_read(item.path.display().to_string(), e))?;

        let outline = self
            .summarizer
            .as_ref()
            .and_then(|s| s.summarize(item.id.as_str(), &content));

        let prompt = render_prompt(&item.id, &content, outline.as_deref(), self.max_chars);
        debug!(
            "Built prompt for {} ({} chars, outline: {})",
            item.id,
            prompt.len(),
            outline.is_some()
        );

        Ok(RequestPayload {
            id: item.id.clone(),
            prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_is_deterministic() {
        let id = ItemId::new("src/lib.rs");
        let a = render_prompt(&id, "pub fn x() {}", Some("- fn `x` (line 1)"), 1000);
        let b = render_prompt(&id, "pub fn x() {}", Some("- fn `x` (line 1)"), 1000);
        assert_eq!(a, b);
        assert!(a.contains("# File\n\nsrc/lib.rs"));
        assert!(a.contains("# Structure"));
        assert!(a.contains("```rust\npub fn x() {}\n```"));
        assert!(!a.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_render_without_outline() {
        let id = ItemId::new("notes.txt");
        let prompt = render_prompt(&id, "hello", None, 1000);
        assert!(!prompt.contains("# Structure"));
        assert!(prompt.contains("```text\nhello\n```"));
    }

    #[test]
    fn test_truncation_on_char_boundary() {
        let (kept, cut) = truncate_chars("héllo wörld", 4);
        assert_eq!(kept, "héll");
        assert!(cut);

        let (kept, cut) = truncate_chars("abc", 3);
        assert_eq!(kept, "abc");
        assert!(!cut);

        let prompt = render_prompt(&ItemId::new("a.py"), "ééééé", None, 2);
        assert!(prompt.contains("éé\n[truncated]"));
    }

    #[test]
    fn test_build_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();

        let builder = RequestBuilder::from_config(&AnalysisConfig::default());
        let payload = builder.build(&WorkItem::new("main.rs", &path)).unwrap();
        assert_eq!(payload.id.as_str(), "main.rs");
        assert!(payload.prompt.contains("fn main() {}"));
        assert!(payload.prompt.contains("- fn `main` (line 1)"));
    }

    #[test]
    fn test_build_rejects_missing_and_non_utf8() {
        let dir = TempDir::new().unwrap();
        let builder = RequestBuilder::new(100);

        let missing = builder.build(&WorkItem::new("gone.rs", dir.path().join("gone.rs")));
        assert!(matches!(missing, Err(QuotaDocError::ItemRead { .. })));

        let binary = dir.path().join("blob.rs");
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        let result = builder.build(&WorkItem::new("blob.rs", &binary));
        assert!(matches!(result, Err(QuotaDocError::ItemRead { .. })));
    }
}
