//! Run Command
//!
//! Executes one documentation batch: scan, generate, persist. Safe to
//! interrupt and re-run; completed items are never requested again.

use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::ai::{CredentialRotator, RequestBuilder, create_client};
use crate::analyzer::FileScanner;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, Overrides};
use crate::pipeline::{BatchRunner, RunOutcome, RunReport, RunnerConfig, plan};
use crate::types::Result;
use crate::wiki::MarkdownSink;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub overrides: Overrides,
    pub dry_run: bool,
}

pub fn run(config_path: Option<&Path>, options: RunOptions) -> Result<()> {
    let ctx = CommandContext::load(config_path)?.with_overrides(options.overrides)?;
    let root = ctx.require_source_root()?.to_path_buf();
    let scanner = FileScanner::from_config(&root, &ctx.config.analysis)?;
    let runner_config = RunnerConfig::from(&ctx.config.quota);

    if options.dry_run {
        return dry_run(&ctx, &scanner, runner_config);
    }

    // Startup failures surface before any state is touched
    let rotator = CredentialRotator::from_config(&ctx.config.llm)?;
    let client = create_client(&ctx.config.llm)?;
    let sink = Arc::new(MarkdownSink::new(ctx.output_dir()));
    let builder = RequestBuilder::from_config(&ctx.config.analysis);

    let mut runner = BatchRunner::new(
        ctx.progress_store(),
        rotator,
        builder,
        client,
        sink,
        runner_config,
    );

    let run_id = Uuid::new_v4();
    let span = info_span!("run", id = %run_id);
    info!(parent: &span, "Documenting {} into {}", root.display(), ctx.output_dir().display());

    let rt = Runtime::new()?;
    let report = rt.block_on(
        async {
            tokio::select! {
                report = runner.run(&scanner) => report.map(Some),
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted; progress up to the last finished item is saved");
                    Ok(None)
                }
            }
        }
        .instrument(span),
    )?;

    match report {
        Some(report) => print_report(&report, ctx.output_dir()),
        None => Output::new().warning("Interrupted. Re-run to continue where this run stopped."),
    }
    Ok(())
}

fn dry_run(ctx: &CommandContext, scanner: &FileScanner, config: RunnerConfig) -> Result<()> {
    let planned = plan(&ctx.progress_store(), scanner, config)?;
    let out = Output::new();

    out.header("Dry run (no API calls)");
    out.field("Quota day", planned.date);
    out.field(
        "Attempts",
        format!("{}/{} ({} left)", planned.count, planned.daily_cap, planned.remaining_quota),
    );
    out.field("Candidates", planned.candidates);
    out.field("Completed", planned.completed);
    out.field("Abandoned", planned.abandoned.len());
    out.field("Pending", planned.pending.len());

    if !planned.pending.is_empty() {
        out.section("Next up");
        let next = planned.pending.len().min(planned.remaining_quota as usize);
        for id in planned.pending.iter().take(next) {
            out.item(id);
        }
        if planned.pending.len() > next {
            out.info(&format!(
                "{} more item(s) wait for a later quota window",
                planned.pending.len() - next
            ));
        }
    }
    Ok(())
}

fn print_report(report: &RunReport, output_dir: &Path) {
    let out = Output::new();
    let stats = &report.stats;

    out.header("Run summary");
    out.field("Outcome", report.outcome);
    out.field("Completed", stats.completed);
    out.field("Empty", stats.skipped_empty);
    out.field("Errors", stats.skipped_error);
    out.field("Abandoned", stats.abandoned);
    out.field("Attempts", stats.attempts);
    out.field("Rotations", stats.rotations);
    out.field(
        "Done overall",
        format!("{}/{}", stats.already_completed + stats.completed, stats.candidates),
    );
    out.field("Output", output_dir.display());

    match report.outcome {
        RunOutcome::Finished => out.success("Batch finished"),
        RunOutcome::QuotaHalted(_) => {
            out.warning(&format!(
                "Stopped with {} item(s) left; run again in the next quota window",
                report.remaining()
            ));
        }
    }
}
