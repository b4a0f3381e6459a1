//! Reset Command
//!
//! Clear all or part of the persisted progress.

use std::path::Path;

use tracing::info;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::storage::ProgressRecord;
use crate::types::{QuotaDocError, Result};

/// Which parts of the progress record to clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetScope {
    pub all: bool,
    pub failures: bool,
    pub quota: bool,
}

/// Apply a partial reset to a record
pub fn apply(scope: ResetScope, record: &mut ProgressRecord) {
    if scope.failures {
        record.failures.clear();
    }
    if scope.quota {
        record.count = 0;
    }
}

pub fn run(config_path: Option<&Path>, scope: ResetScope) -> Result<()> {
    if !(scope.all || scope.failures || scope.quota) {
        return Err(QuotaDocError::Config(
            "Nothing to reset: pass --all, --failures or --quota".to_string(),
        ));
    }

    let ctx = CommandContext::load(config_path)?;
    let store = ctx.progress_store();
    let out = Output::new();

    if scope.all {
        if store.clear()? {
            info!("Removed {}", store.path().display());
            out.success("Progress cleared; every item will be documented again");
        } else {
            out.info("No progress recorded yet");
        }
        return Ok(());
    }

    let mut record = store.rollover(store.load());
    apply(scope, &mut record);
    store.save(&record)?;

    if scope.failures {
        out.success("Failure counters cleared");
    }
    if scope.quota {
        out.success(&format!("Attempt counter for {} reset to 0", record.date));
    }
    Ok(())
}
