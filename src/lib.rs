//! Execution Coach - deterministic execution analysis for weekly activity logs
//!
//! The engine turns a week of logged activities into an execution report
//! through a deterministic pipeline: normalization → classification →
//! aggregation → pattern detection → verdict → rendering.
//!
//! ## Modules
//!
//! - **Pipeline**: `ExecutionEngine` runs every stage over one week of entries
//! - **Schema**: daily log files and the week loader feeding the pipeline

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod renderer;
pub mod schema;
pub mod types;
pub mod verdict;

pub use config::{CliOverrides, EngineConfig};
pub use error::AuditError;
pub use pipeline::{entries_to_report, ExecutionEngine};
pub use renderer::{ReportFormat, ReportRenderer};

// Schema exports
pub use schema::{DailyLog, FileIssue, LogAdapter, LogValidationError, WeekLog};

pub use types::{
    AnalysisOutcome, CategoryLabel, DetectedPattern, PatternKind, RawEntry, Verdict,
    WeeklyAggregate, WeeklyAnalysis,
};

/// Crate version
pub const COACH_VERSION: &str = env!("CARGO_PKG_VERSION");
