//! Pipeline orchestration
//!
//! This module provides the public API for the execution coach.
//! It wires the stages from raw activity entries to the rendered report.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::error::AuditError;
use crate::normalizer::RecordNormalizer;
use crate::patterns::PatternDetector;
use crate::renderer::{ReportFormat, ReportRenderer};
use crate::schema::{LogAdapter, WeekLog};
use crate::types::{ActivityRecord, AnalysisOutcome, ClassifiedActivity, RawEntry, WeeklyAnalysis};
use crate::verdict::VerdictEngine;

/// Analyze a JSON array of raw entries with the default configuration and
/// render the report.
///
/// # Example
/// ```ignore
/// let markdown = entries_to_report(entries_json, ReportFormat::Markdown)?;
/// ```
pub fn entries_to_report(json: String, format: ReportFormat) -> Result<String, AuditError> {
    let entries = LogAdapter::parse_array(&json)?;
    ExecutionEngine::with_defaults().report(&entries, format)
}

/// Analysis engine bound to one validated configuration.
///
/// The configuration is frozen at construction and shared read-only, so one
/// engine can serve any number of runs, including concurrent ones. Each run
/// owns its records from ingestion to rendering.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    config: Arc<EngineConfig>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExecutionEngine {
    /// Validate the configuration and build an engine around it
    pub fn new(mut config: EngineConfig) -> Result<Self, AuditError> {
        config.normalize_markers();
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Engine with the compiled defaults
    pub fn with_defaults() -> Self {
        Self {
            config: Arc::new(EngineConfig::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every stage over a week of raw entries.
    ///
    /// Invalid entries become warnings and are excluded. When nothing valid
    /// remains, the outcome is `InsufficientData` rather than a score.
    pub fn analyze(&self, entries: &[RawEntry]) -> WeeklyAnalysis {
        // Stage 1: Normalize raw entries into activity records
        let (records, warnings) = RecordNormalizer::normalize_all(entries);
        debug!(
            accepted = records.len(),
            rejected = warnings.len(),
            "normalized entries"
        );

        let report_id = report_id(&records);

        // Stage 2: Classify
        let activities = Classifier::new(&self.config).classify_all(records);
        debug!(activities = activities.len(), "classified activities");

        // Stages 3-5: Aggregate, detect patterns, decide the verdict
        let outcome = self.score(&activities);

        WeeklyAnalysis {
            report_id,
            period: None,
            activities,
            warnings,
            self_assessment: None,
            outcome,
        }
    }

    /// Analyze a week assembled from daily log files.
    ///
    /// A week with no usable log is `InsufficientData`, naming the files
    /// that were rejected.
    pub fn analyze_week(&self, week: &WeekLog) -> WeeklyAnalysis {
        let mut analysis = self.analyze(&week.to_entries());
        analysis.period = week.period();
        analysis.self_assessment = week.self_assessment();

        if week.is_empty() {
            let rejected: Vec<String> = week
                .rejected_files()
                .iter()
                .map(|issue| issue.path.display().to_string())
                .collect();
            let reason = if rejected.is_empty() {
                "no daily logs were provided".to_string()
            } else {
                format!(
                    "no valid daily logs ({} rejected: {})",
                    rejected.len(),
                    rejected.join(", ")
                )
            };
            warn!(%reason, "no execution score for this week");
            analysis.outcome = AnalysisOutcome::InsufficientData { reason };
        }
        analysis
    }

    /// Analyze raw entries and render the report
    pub fn report(&self, entries: &[RawEntry], format: ReportFormat) -> Result<String, AuditError> {
        ReportRenderer::render(&self.analyze(entries), format)
    }

    fn score(&self, activities: &[ClassifiedActivity]) -> AnalysisOutcome {
        let aggregate = match Aggregator::aggregate(activities) {
            Ok(aggregate) => aggregate,
            Err(e) => {
                warn!(error = %e, "no execution score for this run");
                let reason = match e {
                    AuditError::DivisionUndefined(reason) => reason,
                    other => other.to_string(),
                };
                return AnalysisOutcome::InsufficientData { reason };
            }
        };
        debug!(
            total_minutes = aggregate.total_minutes,
            execution_score = aggregate.execution_score,
            "aggregated week"
        );

        let patterns = PatternDetector::new(&self.config).detect(activities);
        let plan = VerdictEngine::new(&self.config).plan(&aggregate, &patterns, activities);

        info!(
            execution_score = aggregate.execution_score,
            verdict = plan.verdict.label(),
            patterns = patterns.len(),
            "week analyzed"
        );

        AnalysisOutcome::Scored {
            aggregate,
            patterns,
            plan,
        }
    }
}

/// Stable identifier over the accepted records
fn report_id(records: &[ActivityRecord]) -> Uuid {
    // Records hold only strings, integers and string sets, which always serialize
    let canonical = serde_json::to_vec(records).unwrap_or_default();
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &canonical)
}
