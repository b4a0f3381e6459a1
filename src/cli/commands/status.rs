//! Status Command
//!
//! Show quota usage and batch progress without calling the API.

use std::path::Path;

use crate::analyzer::FileScanner;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, is_initialized};
use crate::pipeline::{RunnerConfig, plan};
use crate::types::Result;

pub fn run(config_path: Option<&Path>, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.progress_store();
    let scanner = FileScanner::from_config(ctx.require_source_root()?, &ctx.config.analysis)?;
    let planned = plan(&store, &scanner, RunnerConfig::from(&ctx.config.quota))?;
    let record = store.load();

    if matches!(format, "json" | "yaml") {
        let status = serde_json::json!({
            "initialized": is_initialized(),
            "state_file": store.path(),
            "updated_at": record.updated_at,
            "plan": planned,
        });
        let rendered = if format == "json" {
            serde_json::to_string_pretty(&status)?
        } else {
            serde_yaml::to_string(&status)?
        };
        println!("{}", rendered);
        return Ok(());
    }

    let out = Output::new();
    out.header("quotadoc status");
    if !is_initialized() {
        out.warning("Not initialized (using defaults). Run 'quotadoc init' to create a config.");
    }

    out.section("Quota");
    out.field("Day (UTC)", planned.date);
    out.field("Attempts", format!("{}/{}", planned.count, planned.daily_cap));
    out.field("Remaining", planned.remaining_quota);

    out.section("Progress");
    out.field("Candidates", planned.candidates);
    out.field("Completed", planned.completed);
    out.field("Pending", planned.pending.len());
    out.field("Abandoned", planned.abandoned.len());
    if let Some(updated_at) = record.updated_at {
        out.field("Last saved", updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    if !planned.abandoned.is_empty() {
        out.section("Abandoned items");
        for id in &planned.abandoned {
            out.item(format!("{} ({} failures)", id, record.failure_count(id)));
        }
        out.info("Clear with 'quotadoc reset --failures' to retry them");
    }

    Ok(())
}
