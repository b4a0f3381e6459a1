//! Progress Persistence
//!
//! Durable, resumable batch state stored as a single JSON document:
//!
//! ```json
//! { "completed": ["src/lib.rs"], "date": "2026-01-31", "count": 17 }
//! ```
//!
//! Every field carries a serde default so older or hand-edited files still
//! load. Writes go to a sibling temporary file which is synced and renamed
//! over the target, so readers only ever observe a fully written document.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{ItemId, Result};

// =============================================================================
// Clock
// =============================================================================

/// Source of "today" for quota windows
pub trait Clock: Send + Sync {
    /// Current UTC calendar date
    fn today(&self) -> NaiveDate;
}

/// Wall-clock UTC date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to one date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub type SharedClock = Arc<dyn Clock>;

// =============================================================================
// Progress Record
// =============================================================================

/// Resumable batch state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    /// Items already documented successfully
    pub completed: BTreeSet<ItemId>,

    /// UTC day of the quota window in effect
    pub date: NaiveDate,

    /// API attempts charged against `date`
    pub count: u32,

    /// Consecutive failed attempts per item, cleared on success
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<ItemId, u32>,

    /// Time of the last successful save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// On-disk shape; a missing `date` is filled in from the reader's clock
#[derive(Deserialize)]
struct StoredRecord {
    #[serde(default)]
    completed: BTreeSet<ItemId>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    count: u32,
    #[serde(default)]
    failures: BTreeMap<ItemId, u32>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Fresh state for the given quota day
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            completed: BTreeSet::new(),
            date,
            count: 0,
            failures: BTreeMap::new(),
            updated_at: None,
        }
    }

    /// Decode a state document, dating it `today` when it carries no date
    pub fn from_json(content: &str, today: NaiveDate) -> serde_json::Result<Self> {
        let stored: StoredRecord = serde_json::from_str(content)?;
        Ok(Self {
            completed: stored.completed,
            date: stored.date.unwrap_or(today),
            count: stored.count,
            failures: stored.failures,
            updated_at: stored.updated_at,
        })
    }

    pub fn is_completed(&self, id: &ItemId) -> bool {
        self.completed.contains(id)
    }

    /// Charge one API attempt against the current window
    pub fn charge_attempt(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Mark an item done; also forgets any failure history
    pub fn mark_completed(&mut self, id: &ItemId) {
        self.failures.remove(id);
        self.completed.insert(id.clone());
    }

    /// Record a failed charged attempt, returning the new streak length
    pub fn record_failure(&mut self, id: &ItemId) -> u32 {
        let streak = self.failures.entry(id.clone()).or_insert(0);
        *streak = streak.saturating_add(1);
        *streak
    }

    pub fn failure_count(&self, id: &ItemId) -> u32 {
        self.failures.get(id).copied().unwrap_or(0)
    }

    /// Whether the item has failed often enough to stop retrying (0 = never)
    pub fn is_abandoned(&self, id: &ItemId, max_failures: u32) -> bool {
        max_failures > 0 && self.failure_count(id) >= max_failures
    }
}

/// Reset the attempt counter when the observed day differs from the window.
///
/// Pure: the caller persists the result. `completed` and `failures` are kept.
pub fn rollover_if_new_day(record: ProgressRecord, today: NaiveDate) -> ProgressRecord {
    if record.date == today {
        return record;
    }
    ProgressRecord {
        date: today,
        count: 0,
        ..record
    }
}

// =============================================================================
// Progress Store
// =============================================================================

/// JSON-file backed store for [`ProgressRecord`]
pub struct ProgressStore {
    path: PathBuf,
    clock: SharedClock,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: SharedClock) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load persisted state.
    ///
    /// Missing, unreadable and corrupt files all yield a fresh record: losing
    /// resumability is preferable to halting the pipeline.
    pub fn load(&self) -> ProgressRecord {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No progress file at {}, starting fresh", self.path.display());
                return ProgressRecord::fresh(self.today());
            }
            Err(e) => {
                warn!(
                    "Cannot read progress file {}: {}. Starting fresh",
                    self.path.display(),
                    e
                );
                return ProgressRecord::fresh(self.today());
            }
        };

        match ProgressRecord::from_json(&content, self.today()) {
            Ok(record) => {
                debug!(
                    "Loaded progress: {} completed, {} attempts on {}",
                    record.completed.len(),
                    record.count,
                    record.date
                );
                record
            }
            Err(e) => {
                warn!(
                    "Progress file {} is corrupt ({}). Starting fresh",
                    self.path.display(),
                    e
                );
                ProgressRecord::fresh(self.today())
            }
        }
    }

    /// Atomically overwrite the persisted state
    pub fn save(&self, record: &ProgressRecord) -> Result<()> {
        let mut stamped = record.clone();
        stamped.updated_at = Some(Utc::now());
        let bytes = serde_json::to_vec_pretty(&stamped)?;
        write_atomic(&self.path, &bytes)?;
        debug!(
            "Progress saved: {} completed, count={}",
            stamped.completed.len(),
            stamped.count
        );
        Ok(())
    }

    /// Roll the record over to today's window using this store's clock
    pub fn rollover(&self, record: ProgressRecord) -> ProgressRecord {
        rollover_if_new_day(record, self.today())
    }

    /// Delete the state file; absent files are not an error
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `bytes` to `path` via a synced temporary file and a rename.
///
/// The parent directory is synced after the rename so the new entry
/// survives a crash. The temporary file is removed if any step fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let written = write_synced(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp)
            && cleanup.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove {}: {}", tmp.display(), cleanup);
        }
        return Err(e.into());
    }

    fsync_dir(parent);
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Best-effort directory fsync; not every platform supports it
fn fsync_dir(dir: &Path) {
    match fs::File::open(dir) {
        Ok(handle) => {
            if let Err(e) = handle.sync_all() {
                warn!("Directory fsync failed for {}: {}", dir.display(), e);
            }
        }
        Err(e) => warn!("Cannot open {} for fsync: {}", dir.display(), e),
    }
}
