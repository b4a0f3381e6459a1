//! Config Command
//!
//! Usage:
//!   quotadoc config show [-f json|yaml]
//!   quotadoc config path
//!   quotadoc config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration. API keys are never printed.
pub fn show(config_path: Option<&Path>, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let rendered = ConfigLoader::render_config(&ctx.config, format)?;
    if format != "json" && format != "yaml" {
        println!("# Effective configuration (defaults, global, project, env)\n");
    }
    println!("{}", rendered);
    Ok(())
}

/// Show configuration paths
pub fn path(config_path: Option<&Path>) -> Result<()> {
    let project = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(ConfigLoader::project_config_path);
    ConfigLoader::show_path(&project);
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    let out = Output::new();
    out.success("Initialized global configuration");
    out.field("Directory", dir.display());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        out.field("Config", config_path.display());
    }
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let project_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project");

    let dir = ConfigLoader::init_project(Some(project_name), force)?;
    let out = Output::new();
    out.success("Initialized project configuration");
    out.field("Directory", dir.display());
    out.field("Config", ConfigLoader::project_config_path().display());
    Ok(())
}
