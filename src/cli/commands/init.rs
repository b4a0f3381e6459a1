//! Init Command
//!
//! Initialize quotadoc in the current directory.

use crate::cli::ui::Output;
use crate::cli::util::{QUOTADOC_DIR, is_initialized};
use crate::config::ConfigLoader;
use crate::types::{QuotaDocError, Result};

pub fn run(force: bool) -> Result<()> {
    if is_initialized() && !force {
        return Err(QuotaDocError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    let root = std::env::current_dir()?;
    let project_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string();

    ConfigLoader::init_project(Some(&project_name), force)?;

    // Global config is a convenience; never overwrite it from here
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let out = Output::new();
    out.success(&format!("Initialized quotadoc in {}/", QUOTADOC_DIR));
    out.field("Project", &project_name);
    println!();
    println!("Next steps:");
    println!("  1. Export GEMINI_API_KEY (or QUOTADOC_API_KEYS=key1,key2)");
    println!("  2. Run 'quotadoc run --dry-run' to preview the batch");
    println!("  3. Run 'quotadoc run' daily until everything is documented");

    Ok(())
}
