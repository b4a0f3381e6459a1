//! Batch Pipeline
//!
//! Orchestration of one documentation run over the candidate list.

pub mod runner;

pub use runner::{
    BatchRunner, HaltReason, ItemState, RunOutcome, RunPlan, RunReport, RunStats, RunnerConfig,
    plan,
};
