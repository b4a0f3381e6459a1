//! Language Detection Module
//!
//! Single source of truth for language detection: syntax-highlight tags for
//! prompts and the tree-sitter grammar used for outlines.
//!
//! ```rust,ignore
//! use quotadoc::analyzer::parser::language::{Language, detect_language_or_text};
//!
//! assert_eq!(Language::from_path("src/main.rs"), Language::Rust);
//! assert_eq!(detect_language_or_text("notes.xyz"), "text");
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// =============================================================================
// Language Metadata Table
// =============================================================================

/// Language metadata entry
struct LanguageMeta {
    /// Display name (human-readable)
    display_name: &'static str,
    /// Syntax highlighting identifier (lowercase, for markdown code blocks)
    highlight_str: &'static str,
    /// File extensions that map to this language
    extensions: &'static [&'static str],
}

macro_rules! lang_meta {
    ($display:literal, $highlight:literal, [$($ext:literal),*]) => {
        LanguageMeta {
            display_name: $display,
            highlight_str: $highlight,
            extensions: &[$($ext),*],
        }
    };
}

/// Languages recognized for prompts and outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    // With tree-sitter outline support
    Rust,
    Go,
    C,
    Cpp,
    Java,
    Kotlin,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Ruby,
    Bash,

    // Highlight only
    CSharp,
    Swift,
    Scala,
    Php,
    Lua,

    #[default]
    Unknown,
}

/// Every variant with a file extension, for reverse lookup
const ALL: &[Language] = &[
    Language::Rust,
    Language::Go,
    Language::C,
    Language::Cpp,
    Language::Java,
    Language::Kotlin,
    Language::TypeScript,
    Language::Tsx,
    Language::JavaScript,
    Language::Python,
    Language::Ruby,
    Language::Bash,
    Language::CSharp,
    Language::Swift,
    Language::Scala,
    Language::Php,
    Language::Lua,
];

impl Language {
    fn meta(&self) -> LanguageMeta {
        match self {
            Language::Rust => lang_meta!("Rust", "rust", ["rs"]),
            Language::Go => lang_meta!("Go", "go", ["go"]),
            Language::C => lang_meta!("C", "c", ["c", "h"]),
            Language::Cpp => lang_meta!("C++", "cpp", ["cpp", "cc", "cxx", "hpp", "hh", "hxx"]),
            Language::Java => lang_meta!("Java", "java", ["java"]),
            Language::Kotlin => lang_meta!("Kotlin", "kotlin", ["kt", "kts"]),
            Language::TypeScript => lang_meta!("TypeScript", "typescript", ["ts", "mts", "cts"]),
            Language::Tsx => lang_meta!("TSX", "tsx", ["tsx"]),
            Language::JavaScript => lang_meta!("JavaScript", "javascript", ["js", "mjs", "cjs", "jsx"]),
            Language::Python => lang_meta!("Python", "python", ["py", "pyi"]),
            Language::Ruby => lang_meta!("Ruby", "ruby", ["rb", "rake"]),
            Language::Bash => lang_meta!("Bash", "bash", ["sh", "bash", "zsh"]),
            Language::CSharp => lang_meta!("C#", "csharp", ["cs"]),
            Language::Swift => lang_meta!("Swift", "swift", ["swift"]),
            Language::Scala => lang_meta!("Scala", "scala", ["scala", "sc"]),
            Language::Php => lang_meta!("PHP", "php", ["php"]),
            Language::Lua => lang_meta!("Lua", "lua", ["lua"]),
            Language::Unknown => lang_meta!("Unknown", "text", []),
        }
    }

    /// Detect from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        ALL.iter()
            .copied()
            .find(|lang| lang.meta().extensions.contains(&ext.as_str()))
            .unwrap_or(Language::Unknown)
    }

    /// Detect from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn display_name(&self) -> &'static str {
        self.meta().display_name
    }

    pub fn highlight_str(&self) -> &'static str {
        self.meta().highlight_str
    }

    pub fn is_known(&self) -> bool {
        *self != Language::Unknown
    }

    /// Tree-sitter grammar for outline extraction, when bundled
    pub fn grammar(&self) -> Option<tree_sitter::Language> {
        let lang: tree_sitter::Language = match self {
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
            Language::C => tree_sitter_c::LANGUAGE.into(),
            Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
            Language::Kotlin => tree_sitter_kotlin_sg::LANGUAGE.into(),
            // TypeScript grammar is a superset of JavaScript
            Language::TypeScript | Language::JavaScript => {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Ruby => tree_sitter_ruby::LANGUAGE.into(),
            Language::Bash => tree_sitter_bash::LANGUAGE.into(),
            _ => return None,
        };
        Some(lang)
    }

    pub fn has_outline_support(&self) -> bool {
        self.grammar().is_some()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Syntax-highlight tag for a path, falling back to "text"
pub fn detect_language_or_text<P: AsRef<Path>>(path: P) -> &'static str {
    Language::from_path(path).highlight_str()
}
