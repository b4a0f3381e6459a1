//! Language Parser Module
//!
//! Language detection and tree-sitter outlines.
//!
//! ```rust,ignore
//! use quotadoc::analyzer::parser::StructureSummarizer;
//!
//! let outline = StructureSummarizer::new().summarize("src/main.rs", content);
//! ```

pub mod language;
pub mod outline;

pub use language::{Language, detect_language_or_text};
pub use outline::{Outline, OutlineEntry, StructureSummarizer};
