//! Core types for the execution analysis pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw entries, normalized activity records, classified activities,
//! the weekly aggregate, detected patterns and the verdict-bearing analysis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Activity kind declared by the person who logged the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    Production,
    Consumption,
    Both,
    Learning,
}

/// One raw activity entry as delivered by the ingestion front end.
///
/// Fields are deliberately loose so that a single malformed entry is rejected
/// during normalization instead of failing the whole input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Free-text label; empty when missing
    #[serde(default)]
    pub description: String,
    /// Minutes spent; must be a positive whole number to be accepted
    #[serde(default)]
    pub duration_minutes: f64,
    /// File path, commit id, document link or URL
    #[serde(default, alias = "artifact", skip_serializing_if = "Option::is_none")]
    pub declared_artifact: Option<String>,
    /// Ordinal day within the week; only 1-7 is accepted
    #[serde(default)]
    pub day_index: i64,
    /// Declared category hint; never overrides classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_kind: Option<DeclaredKind>,
}

impl RawEntry {
    pub fn new(description: &str, duration_minutes: i64, artifact: Option<&str>, day_index: u8) -> Self {
        Self {
            description: description.to_string(),
            duration_minutes: duration_minutes as f64,
            declared_artifact: artifact.map(str::to_string),
            day_index: i64::from(day_index),
            declared_kind: None,
        }
    }

    pub fn with_kind(mut self, kind: DeclaredKind) -> Self {
        self.declared_kind = Some(kind);
        self
    }
}

/// One validated, normalized unit of logged time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Position of the entry in the caller's input sequence
    pub source_index: usize,
    pub description: String,
    /// Always greater than zero
    pub duration_minutes: u32,
    /// Present only when non-empty and not the literal "none"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_artifact: Option<String>,
    /// Lowercase punctuation-free tokens derived from the description
    pub keywords: BTreeSet<String>,
    pub day_index: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_kind: Option<DeclaredKind>,
}

/// Production category assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLabel {
    PureConsumption,
    DirectProduction,
    Mixed,
}

impl CategoryLabel {
    pub const ALL: [CategoryLabel; 3] = [
        CategoryLabel::PureConsumption,
        CategoryLabel::DirectProduction,
        CategoryLabel::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLabel::PureConsumption => "pure_consumption",
            CategoryLabel::DirectProduction => "direct_production",
            CategoryLabel::Mixed => "mixed",
        }
    }
}

/// An activity record paired with its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedActivity {
    pub record: ActivityRecord,
    pub label: CategoryLabel,
    /// True iff the activity produced a retrievable artifact
    pub has_real_output: bool,
}

impl ClassifiedActivity {
    /// 1-based input position; the number reports use to refer to an entry
    pub fn entry_number(&self) -> usize {
        self.record.source_index + 1
    }
}

/// Per-day slice of the weekly aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBreakdown {
    pub day_index: u8,
    pub activities: usize,
    pub activities_with_output: usize,
    pub minutes: u64,
    pub execution_score: f64,
}

/// A zero-output activity and its minute cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroOutputEntry {
    /// Index into the classified sequence, not the input position
    pub index: usize,
    pub description: String,
    pub day_index: u8,
    pub duration_minutes: u32,
}

/// Weekly totals; immutable once computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub total_minutes: u64,
    /// Always holds all three labels and sums to `total_minutes`
    pub minutes_by_category: BTreeMap<CategoryLabel, u64>,
    /// Independently rounded to one decimal; may not sum to 100.0
    pub category_percentages: BTreeMap<CategoryLabel, f64>,
    pub activities_total: usize,
    pub activities_with_output: usize,
    /// `round(100 * activities_with_output / activities_total, 1)`
    pub execution_score: f64,
    pub daily: Vec<DailyBreakdown>,
    pub zero_output: Vec<ZeroOutputEntry>,
    pub zero_output_minutes: u64,
    /// Indices of records declared as production that carry no artifact
    pub declared_production_without_output: Vec<usize>,
}

impl WeeklyAggregate {
    pub fn minutes(&self, label: CategoryLabel) -> u64 {
        self.minutes_by_category.get(&label).copied().unwrap_or(0)
    }

    pub fn percentage(&self, label: CategoryLabel) -> f64 {
        self.category_percentages.get(&label).copied().unwrap_or(0.0)
    }

    /// Total time in hours, one decimal
    pub fn total_hours(&self) -> f64 {
        crate::aggregator::round1(self.total_minutes as f64 / 60.0)
    }
}

/// Closed set of procrastination signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    IdleResearch,
    TaskSwitching,
    PerfectionismStall,
    UnclosedLoop,
}

impl PatternKind {
    pub fn title(&self) -> &'static str {
        match self {
            PatternKind::IdleResearch => "Idle research",
            PatternKind::TaskSwitching => "Task switching",
            PatternKind::PerfectionismStall => "Perfectionism stall",
            PatternKind::UnclosedLoop => "Unclosed loop",
        }
    }
}

/// One detected pattern instance with its supporting evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub kind: PatternKind,
    /// Indices into the classified sequence, ascending
    pub evidence: Vec<usize>,
    pub justification: String,
}

/// Discrete verdict derived from the execution score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    AtRisk,
    Failed,
}

/// Verdict plus the rule block and commitments issued for the next period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub verdict: Verdict,
    /// Approved score framed with an explicit warning because of detected patterns
    pub pattern_warning: bool,
    pub action: String,
    pub mandatory_rules: Vec<String>,
    pub commitments: Vec<String>,
}

/// A record rejected at ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordWarning {
    pub source_index: usize,
    pub description: String,
    pub reason: String,
}

/// Self-assessment collected from daily logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfAssessmentSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_honesty: Option<f64>,
    pub obstacles: Vec<String>,
    pub commitments: Vec<String>,
}

/// Calendar span covered by the analyzed logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Result of the scoring stages, or the reason no score could be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Scored {
        aggregate: WeeklyAggregate,
        patterns: Vec<DetectedPattern>,
        plan: ActionPlan,
    },
    InsufficientData {
        reason: String,
    },
}

/// Everything one run produces before rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAnalysis {
    /// Derived from the accepted records, identical across runs on the same input
    pub report_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<ReportPeriod>,
    pub activities: Vec<ClassifiedActivity>,
    pub warnings: Vec<RecordWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_assessment: Option<SelfAssessmentSummary>,
    pub outcome: AnalysisOutcome,
}

impl WeeklyAnalysis {
    pub fn aggregate(&self) -> Option<&WeeklyAggregate> {
        match &self.outcome {
            AnalysisOutcome::Scored { aggregate, .. } => Some(aggregate),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match &self.outcome {
            AnalysisOutcome::Scored { plan, .. } => Some(plan.verdict),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn plan(&self) -> Option<&ActionPlan> {
        match &self.outcome {
            AnalysisOutcome::Scored { plan, .. } => Some(plan),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn patterns(&self) -> &[DetectedPattern] {
        match &self.outcome {
            AnalysisOutcome::Scored { patterns, .. } => patterns,
            AnalysisOutcome::InsufficientData { .. } => &[],
        }
    }
}
