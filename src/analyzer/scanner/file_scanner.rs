use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::CandidateSource;
use crate::analyzer::parser::Language;
use crate::config::AnalysisConfig;
use crate::constants::analysis::MAX_FILE_SIZE;
use crate::types::{ItemId, QuotaDocError, Result, WorkItem};

pub struct FileScanner {
    root: PathBuf,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
    max_file_size: u64,
    source_only: bool,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include: Vec::new(),
            exclude: Vec::new(),
            max_file_size: MAX_FILE_SIZE,
            source_only: false,
        }
    }

    /// Scanner configured from the `[analysis]` section
    pub fn from_config<P: AsRef<Path>>(root: P, config: &AnalysisConfig) -> Result<Self> {
        let scanner = Self::new(root)
            .with_include(&config.include)?
            .with_exclude(&config.exclude)?
            .with_max_file_size(config.max_file_size);
        Ok(if config.source_only {
            scanner.source_only()
        } else {
            scanner
        })
    }

    /// Relative-path globs a file must match (empty = everything)
    pub fn with_include(mut self, patterns: &[String]) -> Result<Self> {
        self.include = compile_patterns(patterns)?;
        Ok(self)
    }

    /// Relative-path globs that drop a file
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude = compile_patterns(patterns)?;
        Ok(self)
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Only keep files with a recognized source extension
    pub fn source_only(mut self) -> Self {
        self.source_only = true;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root and return matching files, sorted by id
    pub fn scan(&self) -> Result<Vec<WorkItem>> {
        if !self.root.is_dir() {
            return Err(QuotaDocError::Config(format!(
                "Source root is not a directory: {}",
                self.root.display()
            )));
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .build();

        let mut items = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let id = ItemId::from_relative_path(relative);

            if !self.is_included(id.as_str()) || self.is_excluded(id.as_str()) {
                continue;
            }
            if !self.check_source_extension(path) || !self.check_size(path) {
                continue;
            }

            items.push(WorkItem::new(id, path));
        }

        items.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(
            "Scanned {} candidate(s) under {}",
            items.len(),
            self.root.display()
        );
        Ok(items)
    }

    fn is_included(&self, relative: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|p| p.matches(relative))
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(relative))
    }

    fn check_size(&self, path: &Path) -> bool {
        path.metadata()
            .map(|m| m.len() <= self.max_file_size)
            .unwrap_or(false)
    }

    fn check_source_extension(&self, path: &Path) -> bool {
        !self.source_only || Language::from_path(path).is_known()
    }
}

impl CandidateSource for FileScanner {
    fn list_candidates(&self) -> Result<Vec<WorkItem>> {
        self.scan()
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p)
                .map_err(|e| QuotaDocError::Config(format!("Invalid glob '{}': {}", p, e)))
        })
        .collect()
}
