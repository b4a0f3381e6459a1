//! Source Analysis Module
//!
//! - File scanning with gitignore support, producing the candidate list
//! - Language detection and structural outlines for prompts

pub mod parser;
pub mod scanner;

pub use parser::{Language, StructureSummarizer};
pub use scanner::{CandidateSource, FileScanner};
