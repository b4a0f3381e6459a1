//! CLI Common Utilities
//!
//! Shared configuration loading and path resolution for command handlers.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::storage::ProgressStore;
use crate::types::{QuotaDocError, Result};

/// Project data directory name
pub const QUOTADOC_DIR: &str = ".quotadoc";

/// Command-line overrides applied after every config layer
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub cap: Option<u32>,
    pub model: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(root) = self.root {
            config.project.source_root = root;
        }
        if let Some(output) = self.output {
            config.documentation.output_dir = output;
        }
        if let Some(cap) = self.cap {
            config.quota.daily_cap = cap;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        config.validate()
    }
}

/// Command execution context
pub struct CommandContext {
    pub config: Config,
    /// Config file used for the project layer
    pub config_path: PathBuf,
}

impl CommandContext {
    /// Load configuration, honoring an explicit `--config` path.
    ///
    /// Only the default project config may be absent; an explicit path
    /// that does not exist is an error.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) if !path.is_file() => {
                return Err(QuotaDocError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => ConfigLoader::project_config_path(),
        };
        let config = ConfigLoader::load_with(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        overrides.apply(&mut self.config)?;
        Ok(self)
    }

    pub fn progress_store(&self) -> ProgressStore {
        ProgressStore::new(&self.config.quota.state_file)
    }

    pub fn source_root(&self) -> &Path {
        &self.config.project.source_root
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.documentation.output_dir
    }

    /// Fail early when the source root is missing
    pub fn require_source_root(&self) -> Result<&Path> {
        let root = self.source_root();
        if !root.is_dir() {
            return Err(QuotaDocError::Config(format!(
                "Source root does not exist: {}",
                root.display()
            )));
        }
        Ok(root)
    }
}

/// Check if the project directory exists
pub fn is_initialized() -> bool {
    Path::new(QUOTADOC_DIR).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_last() {
        let mut config = Config::default();
        Overrides {
            root: Some(PathBuf::from("src")),
            output: Some(PathBuf::from("out")),
            cap: Some(3),
            model: Some("gemini-1.5-pro".to_string()),
        }
        .apply(&mut config)
        .unwrap();

        assert_eq!(config.project.source_root, PathBuf::from("src"));
        assert_eq!(config.documentation.output_dir, PathBuf::from("out"));
        assert_eq!(config.quota.daily_cap, 3);
        assert_eq!(config.llm.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_zero_cap_override_rejected() {
        let mut config = Config::default();
        let result = Overrides {
            cap: Some(0),
            ..Overrides::default()
        }
        .apply(&mut config);
        assert!(matches!(result, Err(QuotaDocError::Config(_))));
    }

    #[test]
    fn test_missing_explicit_config_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let typo = dir.path().join("confg.toml");

        let result = CommandContext::load(Some(typo.as_path()));
        assert!(matches!(result, Err(QuotaDocError::Config(msg)) if msg.contains("confg.toml")));
    }

    #[test]
    fn test_explicit_config_is_used() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[quota]\ndaily_cap = 12\n").unwrap();

        let ctx = CommandContext::load(Some(path.as_path())).unwrap();
        assert_eq!(ctx.config.quota.daily_cap, 12);
        assert_eq!(ctx.config_path, path);
    }
}
