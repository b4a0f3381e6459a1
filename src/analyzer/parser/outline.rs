//! Structural Outlines
//!
//! Extracts a shallow declaration outline (types, functions, methods) from a
//! source file with tree-sitter. The outline is attached to prompts as
//! optional context; any failure simply yields no outline.

use tracing::debug;

use super::language::Language;
use crate::constants::analysis::MAX_OUTLINE_ENTRIES;
use crate::types::{QuotaDocError, Result};

/// Declaration node kinds per grammar: (node kind, label, descend into it)
type KindTable = &'static [(&'static str, &'static str, bool)];

const RUST_KINDS: KindTable = &[
    ("function_item", "fn", false),
    ("function_signature_item", "fn", false),
    ("struct_item", "struct", false),
    ("enum_item", "enum", false),
    ("trait_item", "trait", true),
    ("impl_item", "impl", true),
    ("mod_item", "mod", true),
    ("const_item", "const", false),
    ("static_item", "static", false),
    ("type_item", "type", false),
    ("macro_definition", "macro", false),
];

const GO_KINDS: KindTable = &[
    ("function_declaration", "func", false),
    ("method_declaration", "method", false),
    ("type_declaration", "type", false),
];

const C_KINDS: KindTable = &[
    ("function_definition", "fn", false),
    ("struct_specifier", "struct", false),
    ("enum_specifier", "enum", false),
    ("type_definition", "typedef", false),
];

const CPP_KINDS: KindTable = &[
    ("function_definition", "fn", false),
    ("class_specifier", "class", true),
    ("struct_specifier", "struct", true),
    ("enum_specifier", "enum", false),
    ("namespace_definition", "namespace", true),
    ("type_definition", "typedef", false),
];

const JAVA_KINDS: KindTable = &[
    ("class_declaration", "class", true),
    ("interface_declaration", "interface", true),
    ("enum_declaration", "enum", true),
    ("record_declaration", "record", true),
    ("method_declaration", "method", false),
    ("constructor_declaration", "constructor", false),
];

const KOTLIN_KINDS: KindTable = &[
    ("class_declaration", "class", true),
    ("object_declaration", "object", true),
    ("function_declaration", "fun", false),
];

const TS_KINDS: KindTable = &[
    ("function_declaration", "function", false),
    ("generator_function_declaration", "function", false),
    ("class_declaration", "class", true),
    ("abstract_class_declaration", "class", true),
    ("method_definition", "method", false),
    ("interface_declaration", "interface", false),
    ("type_alias_declaration", "type", false),
    ("enum_declaration", "enum", false),
];

const PYTHON_KINDS: KindTable = &[
    ("function_definition", "def", false),
    ("class_definition", "class", true),
];

const RUBY_KINDS: KindTable = &[
    ("method", "def", false),
    ("singleton_method", "def self", false),
    ("class", "class", true),
    ("module", "module", true),
];

const BASH_KINDS: KindTable = &[("function_definition", "function", false)];

fn kinds_for(language: Language) -> KindTable {
    match language {
        Language::Rust => RUST_KINDS,
        Language::Go => GO_KINDS,
        Language::C => C_KINDS,
        Language::Cpp => CPP_KINDS,
        Language::Java => JAVA_KINDS,
        Language::Kotlin => KOTLIN_KINDS,
        Language::TypeScript | Language::Tsx | Language::JavaScript => TS_KINDS,
        Language::Python => PYTHON_KINDS,
        Language::Ruby => RUBY_KINDS,
        Language::Bash => BASH_KINDS,
        _ => &[],
    }
}

/// One declaration in an outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub kind: &'static str,
    pub name: String,
    /// 1-based start line
    pub line: usize,
    /// Nesting level (0 = top level)
    pub depth: usize,
}

/// Declaration outline of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    pub language: Language,
    pub entries: Vec<OutlineEntry>,
    /// Entries beyond the cap were dropped
    pub truncated: bool,
}

impl Outline {
    /// Render as a Markdown bullet list
    pub fn to_prompt_section(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&"  ".repeat(entry.depth));
            out.push_str(&format!(
                "- {} `{}` (line {})\n",
                entry.kind, entry.name, entry.line
            ));
        }
        if self.truncated {
            out.push_str("- ... (outline truncated)\n");
        }
        out
    }
}

/// Tree-sitter backed outline extractor
#[derive(Debug, Clone)]
pub struct StructureSummarizer {
    max_entries: usize,
}

impl Default for StructureSummarizer {
    fn default() -> Self {
        Self {
            max_entries: MAX_OUTLINE_ENTRIES,
        }
    }
}

impl StructureSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Outline rendered for a prompt; `None` when unsupported, unparsable or empty
    pub fn summarize(&self, path: &str, content: &str) -> Option<String> {
        match self.outline(path, content) {
            Ok(Some(outline)) if !outline.entries.is_empty() => Some(outline.to_prompt_section()),
            Ok(_) => None,
            Err(e) => {
                debug!("Outline skipped for {}: {}", path, e);
                None
            }
        }
    }

    /// Extract the outline, `Ok(None)` for languages without a grammar
    pub fn outline(&self, path: &str, content: &str) -> Result<Option<Outline>> {
        let language = Language::from_path(path);
        let Some(grammar) = language.grammar() else {
            return Ok(None);
        };

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| QuotaDocError::Parse {
                message: format!("Failed to set {} language: {}", language, e),
                path: path.to_string(),
            })?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| QuotaDocError::Parse {
                message: format!("Failed to parse {} file", language),
                path: path.to_string(),
            })?;

        let mut outline = Outline {
            language,
            entries: Vec::new(),
            truncated: false,
        };
        self.collect(
            tree.root_node(),
            content.as_bytes(),
            kinds_for(language),
            0,
            &mut outline,
        );
        Ok(Some(outline))
    }

    fn collect(
        &self,
        node: tree_sitter::Node,
        src: &[u8],
        kinds: KindTable,
        depth: usize,
        outline: &mut Outline,
    ) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();

        for child in children {
            if outline.entries.len() >= self.max_entries {
                outline.truncated = true;
                return;
            }

            match kinds.iter().find(|(kind, _, _)| *kind == child.kind()) {
                Some((_, label, descend)) => {
                    outline.entries.push(OutlineEntry {
                        kind: label,
                        name: node_name(child, src),
                        line: child.start_position().row + 1,
                        depth,
                    });
                    if *descend {
                        self.collect(child, src, kinds, depth + 1, outline);
                    }
                }
                // Wrappers such as export statements, decorators and bodies
                None => self.collect(child, src, kinds, depth, outline),
            }
        }
    }
}

fn node_text<'a>(node: tree_sitter::Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// Best-effort declaration name
fn node_name(node: tree_sitter::Node, src: &[u8]) -> String {
    if let Some(name) = node.child_by_field_name("name") {
        return node_text(name, src).to_string();
    }

    // Rust impl blocks: `Trait for Type` or `Type`
    if node.kind() == "impl_item"
        && let Some(ty) = node.child_by_field_name("type")
    {
        let ty = node_text(ty, src);
        return match node.child_by_field_name("trait") {
            Some(tr) => format!("{} for {}", node_text(tr, src), ty),
            None => ty.to_string(),
        };
    }

    // C/C++ declarators nest: pointer -> function -> identifier
    if let Some(mut decl) = node.child_by_field_name("declarator") {
        while let Some(inner) = decl.child_by_field_name("declarator") {
            decl = inner;
        }
        return node_text(decl, src).to_string();
    }

    let first_line = node_text(node, src).lines().next().unwrap_or("").trim();
    let trimmed = first_line.trim_end_matches('{').trim_end();
    trimmed.chars().take(80).collect()
}
