//! Batch Runner
//!
//! Drives every pending item through prompt building, generation and the
//! sink, charging the daily quota per API attempt and persisting progress
//! after each mutation.
//!
//! ```text
//! load + rollover -> list candidates -> drop completed
//!     for each item:
//!         abandoned?            -> skip (no call)
//!         count >= cap?         -> QuotaHalted(CapReached)
//!         build payload         -> SkippedError on failure (no call)
//!         count += 1, save, submit
//!             Produced          -> sink -> completed, save
//!             QuotaExhausted    -> rotate, retry same item | QuotaHalted(CredentialsExhausted)
//!             Empty / Transient -> failure streak += 1, save, next item
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::ai::{CredentialRotator, GenerationOutcome, RequestBuilder, SharedClient};
use crate::analyzer::CandidateSource;
use crate::config::QuotaConfig;
use crate::storage::{ProgressRecord, ProgressStore};
use crate::types::{ItemId, Result, WorkItem};
use crate::wiki::DocSink;

// =============================================================================
// Outcomes
// =============================================================================

/// Why a run stopped before visiting every item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// Daily attempt cap reached
    CapReached,
    /// Every credential reported quota exhaustion
    CredentialsExhausted,
}

/// Terminal state of one run. Both variants are clean terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum RunOutcome {
    Finished,
    QuotaHalted(HaltReason),
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::QuotaHalted(HaltReason::CapReached) => write!(f, "halted: daily cap reached"),
            Self::QuotaHalted(HaltReason::CredentialsExhausted) => {
                write!(f, "halted: all credentials exhausted")
            }
        }
    }
}

/// Final state of one item within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Completed,
    SkippedEmpty,
    SkippedError,
    /// Failure ceiling reached on an earlier run; not attempted
    Abandoned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub candidates: usize,
    pub already_completed: usize,
    pub completed: usize,
    pub skipped_empty: usize,
    pub skipped_error: usize,
    pub abandoned: usize,
    /// API calls charged during this run
    pub attempts: u32,
    pub rotations: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: RunStats,
    pub items: Vec<(ItemId, ItemState)>,
    /// Progress as last persisted
    pub record: ProgressRecord,
}

impl RunReport {
    /// Items never reached because the run halted
    pub fn remaining(&self) -> usize {
        self.stats.candidates - self.stats.already_completed - self.items.len()
    }
}

// =============================================================================
// Runner
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    pub daily_cap: u32,
    /// 0 = retry failing items forever
    pub max_item_failures: u32,
}

impl From<&QuotaConfig> for RunnerConfig {
    fn from(config: &QuotaConfig) -> Self {
        Self {
            daily_cap: config.daily_cap,
            max_item_failures: config.max_item_failures,
        }
    }
}

/// Per-item control decision
enum Step {
    Done(ItemState),
    Halt(HaltReason),
}

pub struct BatchRunner {
    store: ProgressStore,
    rotator: CredentialRotator,
    builder: RequestBuilder,
    client: SharedClient,
    sink: Arc<dyn DocSink>,
    config: RunnerConfig,
}

impl BatchRunner {
    pub fn new(
        store: ProgressStore,
        rotator: CredentialRotator,
        builder: RequestBuilder,
        client: SharedClient,
        sink: Arc<dyn DocSink>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            store,
            rotator,
            builder,
            client,
            sink,
            config,
        }
    }

    pub fn rotator(&self) -> &CredentialRotator {
        &self.rotator
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Run the batch to completion or a quota halt.
    ///
    /// Only a failure to list candidates is returned as an error; every
    /// per-item problem becomes a skip.
    #[instrument(skip_all, fields(cap = self.config.daily_cap, provider = self.client.name()))]
    pub async fn run(&mut self, source: &dyn CandidateSource) -> Result<RunReport> {
        let mut record = self.load_current();
        let candidates = source.list_candidates()?;

        let mut stats = RunStats {
            candidates: candidates.len(),
            ..RunStats::default()
        };
        let pending: Vec<WorkItem> = candidates
            .into_iter()
            .filter(|item| !record.is_completed(&item.id))
            .collect();
        stats.already_completed = stats.candidates - pending.len();

        info!(
            "Starting run: {} pending of {} candidates, {}/{} attempts used on {}",
            pending.len(),
            stats.candidates,
            record.count,
            self.config.daily_cap,
            record.date
        );

        let mut outcome = RunOutcome::Finished;
        let mut items = Vec::with_capacity(pending.len());

        for item in &pending {
            match self.process_item(item, &mut record, &mut stats).await {
                Step::Done(state) => {
                    match state {
                        ItemState::Completed => stats.completed += 1,
                        ItemState::SkippedEmpty => stats.skipped_empty += 1,
                        ItemState::SkippedError => stats.skipped_error += 1,
                        ItemState::Abandoned => stats.abandoned += 1,
                    }
                    items.push((item.id.clone(), state));
                }
                Step::Halt(reason) => {
                    outcome = RunOutcome::QuotaHalted(reason);
                    break;
                }
            }
        }

        info!(
            "Run {}: {} completed, {} empty, {} errors, {} abandoned, {} attempts",
            outcome,
            stats.completed,
            stats.skipped_empty,
            stats.skipped_error,
            stats.abandoned,
            stats.attempts
        );

        Ok(RunReport {
            outcome,
            stats,
            items,
            record,
        })
    }

    /// Load, roll over to today's window and persist when the day changed
    fn load_current(&self) -> ProgressRecord {
        let loaded = self.store.load();
        let previous = loaded.date;
        let record = self.store.rollover(loaded);
        if record.date != previous {
            info!(
                "New quota day {} (previous window {}), attempt counter reset",
                record.date, previous
            );
            self.persist(&record);
        }
        record
    }

    #[instrument(skip_all, fields(item = %item.id))]
    async fn process_item(
        &mut self,
        item: &WorkItem,
        record: &mut ProgressRecord,
        stats: &mut RunStats,
    ) -> Step {
        if record.is_abandoned(&item.id, self.config.max_item_failures) {
            warn!(
                "Skipping {} after {} failed attempts",
                item.id,
                record.failure_count(&item.id)
            );
            return Step::Done(ItemState::Abandoned);
        }

        if record.count >= self.config.daily_cap {
            info!("Daily cap of {} attempts reached", self.config.daily_cap);
            return Step::Halt(HaltReason::CapReached);
        }

        let payload = match self.builder.build(item) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Skipping {}: {}", item.id, e);
                return Step::Done(ItemState::SkippedError);
            }
        };

        loop {
            let credential = match self.rotator.current() {
                Ok(credential) => credential.clone(),
                Err(_) => return Step::Halt(HaltReason::CredentialsExhausted),
            };

            // Charged before sending: an interrupted request still counts
            record.charge_attempt();
            stats.attempts += 1;
            self.persist(record);
            let result = self.client.submit(&payload, &credential).await;
            debug!("{} answered {} for {}", credential.label(), result.label(), item.id);

            match result {
                GenerationOutcome::Produced(text) => {
                    return match self.sink.store(&item.id, &text) {
                        Ok(()) => {
                            record.mark_completed(&item.id);
                            self.persist(record);
                            info!("Documented {}", item.id);
                            Step::Done(ItemState::Completed)
                        }
                        Err(e) => {
                            warn!("Sink rejected {}: {}", item.id, e);
                            self.record_failure(&item.id, record);
                            Step::Done(ItemState::SkippedError)
                        }
                    };
                }
                GenerationOutcome::QuotaExhausted => {
                    info!("{} reported quota exhausted", credential.label());
                    if self.rotator.rotate().is_err() {
                        return Step::Halt(HaltReason::CredentialsExhausted);
                    }
                    stats.rotations += 1;
                    // The retry is another charged call
                    if record.count >= self.config.daily_cap {
                        info!("Daily cap of {} attempts reached", self.config.daily_cap);
                        return Step::Halt(HaltReason::CapReached);
                    }
                }
                GenerationOutcome::Empty => {
                    warn!("Empty response for {}", item.id);
                    self.record_failure(&item.id, record);
                    return Step::Done(ItemState::SkippedEmpty);
                }
                GenerationOutcome::TransientError(detail) => {
                    warn!("Generation failed for {}: {}", item.id, detail);
                    self.record_failure(&item.id, record);
                    return Step::Done(ItemState::SkippedError);
                }
            }
        }
    }

    fn record_failure(&self, id: &ItemId, record: &mut ProgressRecord) {
        let streak = record.record_failure(id);
        if self.config.max_item_failures > 0 && streak >= self.config.max_item_failures {
            warn!(
                "{} failed {} times and will be skipped on later runs",
                id, streak
            );
        }
        self.persist(record);
    }

    fn persist(&self, record: &ProgressRecord) {
        if let Err(e) = self.store.save(record) {
            error!(
                "Failed to save progress to {}: {}",
                self.store.path().display(),
                e
            );
        }
    }
}

// =============================================================================
// Planning (no API calls)
// =============================================================================

/// What a run would do right now
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub date: NaiveDate,
    pub count: u32,
    pub daily_cap: u32,
    pub remaining_quota: u32,
    pub candidates: usize,
    pub completed: usize,
    pub pending: Vec<ItemId>,
    pub abandoned: Vec<ItemId>,
}

/// Inspect progress against the candidate list without calling the API or
/// writing anything
pub fn plan(
    store: &ProgressStore,
    source: &dyn CandidateSource,
    config: RunnerConfig,
) -> Result<RunPlan> {
    let record = store.rollover(store.load());
    let candidates = source.list_candidates()?;

    let mut pending = Vec::new();
    let mut abandoned = Vec::new();
    let mut completed = 0;
    for item in &candidates {
        if record.is_completed(&item.id) {
            completed += 1;
        } else if record.is_abandoned(&item.id, config.max_item_failures) {
            abandoned.push(item.id.clone());
        } else {
            pending.push(item.id.clone());
        }
    }

    Ok(RunPlan {
        date: record.date,
        count: record.count,
        daily_cap: config.daily_cap,
        remaining_quota: config.daily_cap.saturating_sub(record.count),
        candidates: candidates.len(),
        completed,
        pending,
        abandoned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Credential, GenerationClient, RequestPayload};
    use crate::storage::FixedClock;
    use crate::types::QuotaDocError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;
    use tempfile::TempDir;

    type Responder = dyn Fn(&str, &str) -> GenerationOutcome + Send + Sync;

    /// Client answering from a closure over (item id, raw key)
    struct StubClient {
        respond: Box<Responder>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubClient {
        fn new(respond: impl Fn(&str, &str) -> GenerationOutcome + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                respond: Box::new(respond),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn produced() -> Arc<Self> {
            Self::new(|id, _| GenerationOutcome::Produced(format!("# {}", id)))
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        async fn submit(&self, payload: &RequestPayload, credential: &Credential) -> GenerationOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((payload.id.to_string(), credential.expose().to_string()));
            (self.respond)(payload.id.as_str(), credential.expose())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    #[derive(Default)]
    struct MemorySink {
        stored: Mutex<Vec<(String, String)>>,
        reject: BTreeSet<String>,
    }

    impl DocSink for MemorySink {
        fn store(&self, id: &ItemId, text: &str) -> Result<()> {
            if self.reject.contains(id.as_str()) {
                return Err(QuotaDocError::sink(id.as_str(), "disk full"));
            }
            self.stored
                .lock()
                .unwrap()
                .push((id.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        items: Vec<WorkItem>,
        today: NaiveDate,
    }

    impl Fixture {
        fn new(ids: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let items = ids
                .iter()
                .map(|id| {
                    let path = dir.path().join("src").join(id);
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(&path, format!("// {}\n", id)).unwrap();
                    WorkItem::new(*id, path)
                })
                .collect();
            Self {
                dir,
                items,
                today: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            }
        }

        fn store(&self) -> ProgressStore {
            ProgressStore::with_clock(
                self.dir.path().join("progress.json"),
                Arc::new(FixedClock(self.today)),
            )
        }

        fn runner(
            &self,
            keys: &[&str],
            client: Arc<StubClient>,
            sink: Arc<MemorySink>,
            daily_cap: u32,
        ) -> BatchRunner {
            BatchRunner::new(
                self.store(),
                CredentialRotator::new(keys).unwrap(),
                RequestBuilder::new(10_000),
                client,
                sink,
                RunnerConfig {
                    daily_cap,
                    max_item_failures: 0,
                },
            )
        }
    }

    #[tokio::test]
    async fn test_attempt_persisted_before_request() {
        let fx = Fixture::new(&["a", "b"]);
        let state = fx.dir.path().join("progress.json");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_client = seen.clone();
        let client = StubClient::new(move |id, _| {
            let saved: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
            seen_by_client
                .lock()
                .unwrap()
                .push(saved["count"].as_u64().unwrap());
            GenerationOutcome::Produced(format!("doc {}", id))
        });
        let mut runner = fx.runner(&["k1"], client, Arc::new(MemorySink::default()), 10);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.record.count, 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_save_failure_does_not_stop_run() {
        let fx = Fixture::new(&["a", "b"]);
        // A regular file where the state directory should be
        let blocker = fx.dir.path().join("state");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = ProgressStore::with_clock(
            blocker.join("progress.json"),
            Arc::new(FixedClock(fx.today)),
        );
        let sink = Arc::new(MemorySink::default());
        let mut runner = BatchRunner::new(
            store,
            CredentialRotator::new(["k1"]).unwrap(),
            RequestBuilder::new(10_000),
            StubClient::produced(),
            sink.clone(),
            RunnerConfig {
                daily_cap: 10,
                max_item_failures: 0,
            },
        );

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(report.stats.completed, 2);
        assert_eq!(report.record.count, 2);
        assert_eq!(sink.stored.lock().unwrap().len(), 2);
        assert!(blocker.is_file());
    }

    fn completed_ids(record: &ProgressRecord) -> Vec<&str> {
        record.completed.iter().map(|id| id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_scenario_empty_middle_item() {
        let fx = Fixture::new(&["a", "b", "c"]);
        let client = StubClient::new(|id, _| match id {
            "b" => GenerationOutcome::Empty,
            other => GenerationOutcome::Produced(format!("doc {}", other)),
        });
        let sink = Arc::new(MemorySink::default());
        let mut runner = fx.runner(&["k1"], client, sink.clone(), 10);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(completed_ids(&report.record), vec!["a", "c"]);
        assert_eq!(report.record.count, 3);
        assert_eq!(report.stats.skipped_empty, 1);
        assert_eq!(
            report.items,
            vec![
                (ItemId::new("a"), ItemState::Completed),
                (ItemId::new("b"), ItemState::SkippedEmpty),
                (ItemId::new("c"), ItemState::Completed),
            ]
        );

        // What was persisted matches what was returned
        let persisted = fx.store().load();
        assert_eq!(persisted.completed, report.record.completed);
        assert_eq!(persisted.count, 3);
        assert_eq!(sink.stored.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_idempotent_resume() {
        let fx = Fixture::new(&["a", "b", "c", "d"]);
        let sink = Arc::new(MemorySink::default());

        let first_client = StubClient::produced();
        let mut first = fx.runner(&["k1"], first_client.clone(), sink.clone(), 2);
        let report = first.run(&fx.items).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::QuotaHalted(HaltReason::CapReached));
        assert_eq!(completed_ids(&report.record), vec!["a", "b"]);

        let second_client = StubClient::produced();
        let mut second = fx.runner(&["k1"], second_client.clone(), sink.clone(), 10);
        let report = second.run(&fx.items).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(report.stats.already_completed, 2);
        assert_eq!(completed_ids(&report.record), vec!["a", "b", "c", "d"]);

        // Every item was sent exactly once across both runs
        let mut sent: Vec<String> = first_client
            .calls()
            .into_iter()
            .chain(second_client.calls())
            .map(|(id, _)| id)
            .collect();
        sent.sort();
        assert_eq!(sent, vec!["a", "b", "c", "d"]);

        // A third run has nothing to do and charges nothing
        let third_client = StubClient::produced();
        let mut third = fx.runner(&["k1"], third_client.clone(), sink, 10);
        let report = third.run(&fx.items).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Finished);
        assert!(third_client.calls().is_empty());
        assert_eq!(report.record.count, 4);
    }

    #[tokio::test]
    async fn test_rotation_on_exhaustion() {
        let fx = Fixture::new(&["only"]);
        let client = StubClient::new(|id, key| match key {
            "k1" => GenerationOutcome::QuotaExhausted,
            _ => GenerationOutcome::Produced(format!("doc {}", id)),
        });
        let mut runner = fx.runner(&["k1", "k2"], client.clone(), Arc::new(MemorySink::default()), 10);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(completed_ids(&report.record), vec!["only"]);
        assert_eq!(report.stats.rotations, 1);
        assert_eq!(runner.rotator().index(), 1);
        // Both attempts were charged
        assert_eq!(report.record.count, 2);
        assert_eq!(
            client.calls(),
            vec![
                ("only".to_string(), "k1".to_string()),
                ("only".to_string(), "k2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_halt_on_full_exhaustion() {
        let fx = Fixture::new(&["a", "b"]);
        let mut seeded = ProgressRecord::fresh(fx.today);
        seeded.mark_completed(&ItemId::new("z"));
        fx.store().save(&seeded).unwrap();

        let client = StubClient::new(|_, _| GenerationOutcome::QuotaExhausted);
        let mut runner = fx.runner(&["k1"], client.clone(), Arc::new(MemorySink::default()), 10);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::QuotaHalted(HaltReason::CredentialsExhausted)
        );
        assert_eq!(completed_ids(&report.record), vec!["z"]);
        assert!(runner.rotator().is_exhausted());
        // One call, then no further calls once exhausted
        assert_eq!(client.calls().len(), 1);
        assert_eq!(report.remaining(), 2);
    }

    #[tokio::test]
    async fn test_cap_enforcement() {
        let fx = Fixture::new(&["1", "2", "3", "4", "5"]);
        let client = StubClient::produced();
        let mut runner = fx.runner(&["k1"], client.clone(), Arc::new(MemorySink::default()), 3);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::QuotaHalted(HaltReason::CapReached));
        assert_eq!(report.record.completed.len(), 3);
        assert_eq!(report.record.count, 3);
        assert!(!runner.rotator().is_exhausted());
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_cap_rechecked_before_rotation_retry() {
        let fx = Fixture::new(&["a"]);
        let client = StubClient::new(|_, key| match key {
            "k1" => GenerationOutcome::QuotaExhausted,
            _ => GenerationOutcome::Produced("doc".into()),
        });
        let mut runner = fx.runner(&["k1", "k2"], client.clone(), Arc::new(MemorySink::default()), 1);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::QuotaHalted(HaltReason::CapReached));
        assert_eq!(report.record.count, 1);
        assert!(report.record.completed.is_empty());
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_day_rollover_resets_count() {
        let fx = Fixture::new(&["a"]);
        let mut yesterday = ProgressRecord::fresh(fx.today.pred_opt().unwrap());
        yesterday.count = 7;
        yesterday.mark_completed(&ItemId::new("old"));
        fx.store().save(&yesterday).unwrap();

        // Cap 7 would already be spent without the rollover
        let mut runner = fx.runner(&["k1"], StubClient::produced(), Arc::new(MemorySink::default()), 7);
        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(report.record.date, fx.today);
        assert_eq!(report.record.count, 1);
        assert_eq!(completed_ids(&report.record), vec!["a", "old"]);
    }

    #[tokio::test]
    async fn test_build_failure_charges_nothing() {
        let fx = Fixture::new(&["a"]);
        let mut items = fx.items.clone();
        items.insert(0, WorkItem::new("missing", fx.dir.path().join("missing.rs")));

        let client = StubClient::produced();
        let mut runner = fx.runner(&["k1"], client.clone(), Arc::new(MemorySink::default()), 10);
        let report = runner.run(&items).await.unwrap();

        assert_eq!(report.items[0], (ItemId::new("missing"), ItemState::SkippedError));
        assert_eq!(report.record.count, 1);
        assert_eq!(client.calls().len(), 1);
        assert_eq!(report.record.failure_count(&ItemId::new("missing")), 0);
    }

    #[tokio::test]
    async fn test_sink_failure_blocks_completion() {
        let fx = Fixture::new(&["a", "b"]);
        let sink = Arc::new(MemorySink {
            reject: ["a".to_string()].into_iter().collect(),
            ..MemorySink::default()
        });
        let mut runner = fx.runner(&["k1"], StubClient::produced(), sink, 10);

        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(completed_ids(&report.record), vec!["b"]);
        assert_eq!(report.record.count, 2);
        assert_eq!(report.record.failure_count(&ItemId::new("a")), 1);
    }

    #[tokio::test]
    async fn test_failure_ceiling_abandons_item() {
        let fx = Fixture::new(&["bad", "good"]);
        let store = fx.store();
        let client = StubClient::new(|id, _| match id {
            "bad" => GenerationOutcome::TransientError("boom".into()),
            _ => GenerationOutcome::Produced("doc".into()),
        });

        let config = RunnerConfig {
            daily_cap: 100,
            max_item_failures: 2,
        };
        for _ in 0..2 {
            let mut runner = BatchRunner::new(
                fx.store(),
                CredentialRotator::new(["k1"]).unwrap(),
                RequestBuilder::new(1000),
                client.clone(),
                Arc::new(MemorySink::default()),
                config,
            );
            runner.run(&fx.items).await.unwrap();
        }
        assert_eq!(store.load().failure_count(&ItemId::new("bad")), 2);
        let calls_before = client.calls().len();

        let mut runner = BatchRunner::new(
            fx.store(),
            CredentialRotator::new(["k1"]).unwrap(),
            RequestBuilder::new(1000),
            client.clone(),
            Arc::new(MemorySink::default()),
            config,
        );
        let report = runner.run(&fx.items).await.unwrap();

        assert_eq!(report.stats.abandoned, 1);
        assert_eq!(client.calls().len(), calls_before);

        let planned = plan(&store, &fx.items, config).unwrap();
        assert_eq!(planned.abandoned, vec![ItemId::new("bad")]);
        assert!(planned.pending.is_empty());
        assert_eq!(planned.completed, 1);
    }

    #[tokio::test]
    async fn test_success_clears_failure_streak() {
        let fx = Fixture::new(&["a"]);
        let mut seeded = ProgressRecord::fresh(fx.today);
        seeded.record_failure(&ItemId::new("a"));
        fx.store().save(&seeded).unwrap();

        let mut runner = fx.runner(&["k1"], StubClient::produced(), Arc::new(MemorySink::default()), 10);
        let report = runner.run(&fx.items).await.unwrap();

        assert!(report.record.failures.is_empty());
        assert_eq!(completed_ids(&report.record), vec!["a"]);
    }

    #[test]
    fn test_plan_reports_remaining_quota() {
        let fx = Fixture::new(&["a", "b"]);
        let mut seeded = ProgressRecord::fresh(fx.today);
        seeded.count = 4;
        seeded.mark_completed(&ItemId::new("a"));
        fx.store().save(&seeded).unwrap();

        let planned = plan(
            &fx.store(),
            &fx.items,
            RunnerConfig {
                daily_cap: 10,
                max_item_failures: 5,
            },
        )
        .unwrap();

        assert_eq!(planned.remaining_quota, 6);
        assert_eq!(planned.completed, 1);
        assert_eq!(planned.pending, vec![ItemId::new("b")]);
    }

    #[derive(Debug, Clone, Copy)]
    enum Scripted {
        Produced,
        Empty,
        Transient,
    }

    fn scripted() -> impl Strategy<Value = Scripted> {
        prop_oneof![
            Just(Scripted::Produced),
            Just(Scripted::Empty),
            Just(Scripted::Transient),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_every_attempt_is_charged_once(script in proptest::collection::vec(scripted(), 1..12)) {
            let ids: Vec<String> = (0..script.len()).map(|i| format!("item{:02}", i)).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let fx = Fixture::new(&id_refs);

            let by_id: HashMap<String, Scripted> = ids.iter().cloned().zip(script.iter().copied()).collect();
            let client = StubClient::new(move |id, _| match by_id[id] {
                Scripted::Produced => GenerationOutcome::Produced("doc".into()),
                Scripted::Empty => GenerationOutcome::Empty,
                Scripted::Transient => GenerationOutcome::TransientError("reset".into()),
            });
            let mut runner = fx.runner(&["k1"], client, Arc::new(MemorySink::default()), 1000);

            let rt = tokio::runtime::Runtime::new().unwrap();
            let report = rt.block_on(async { runner.run(&fx.items).await.unwrap() });

            let produced = script.iter().filter(|s| matches!(s, Scripted::Produced)).count();
            prop_assert_eq!(report.outcome, RunOutcome::Finished);
            prop_assert_eq!(report.record.count as usize, script.len());
            prop_assert_eq!(report.stats.attempts as usize, script.len());
            prop_assert_eq!(report.record.completed.len(), produced);
            prop_assert_eq!(fx.store().load().count as usize, script.len());
        }
    }
}
