//! quotadoc - Resumable, quota-aware documentation generator
//!
//! Walks a source tree, asks a generation API for one Markdown document per
//! file and writes the results next to each other in an output directory.
//! Runs are built for free-tier API limits:
//!
//! - **Attempt-based quota**: every API call counts against a daily cap,
//!   reset automatically when the UTC day changes
//! - **Credential rotation**: keys are used in order; one that reports its
//!   quota spent is never reused within the run
//! - **Resumable**: completed files are recorded in a JSON progress file
//!   after each item and never requested again
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use quotadoc::{BatchRunner, Config, CredentialRotator, FileScanner, MarkdownSink,
//!     ProgressStore, RequestBuilder, RunnerConfig, create_client};
//!
//! let config = Config::default();
//! let mut runner = BatchRunner::new(
//!     ProgressStore::new(&config.quota.state_file),
//!     CredentialRotator::from_config(&config.llm)?,
//!     RequestBuilder::from_config(&config.analysis),
//!     create_client(&config.llm)?,
//!     Arc::new(MarkdownSink::new(&config.documentation.output_dir)),
//!     RunnerConfig::from(&config.quota),
//! );
//! let scanner = FileScanner::from_config(".", &config.analysis)?;
//! let report = runner.run(&scanner).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: credentials, prompt construction, Gemini client
//! - [`analyzer`]: file scanning, language detection, tree-sitter outlines
//! - [`storage`]: JSON progress persistence
//! - [`pipeline`]: the batch runner
//! - [`wiki`]: documentation sinks
//! - [`config`]: layered configuration

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod wiki;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::{ItemId, QuotaDocError, Result, WorkItem};

pub use ai::{
    Credential, CredentialRotator, Exhausted, GenerationClient, GenerationOutcome,
    RequestBuilder, RequestPayload, create_client,
};
pub use analyzer::{CandidateSource, FileScanner, StructureSummarizer};
pub use pipeline::{BatchRunner, HaltReason, ItemState, RunOutcome, RunReport, RunnerConfig};
pub use storage::{ProgressRecord, ProgressStore};
pub use wiki::{DocSink, MarkdownSink};
