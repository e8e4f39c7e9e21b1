//! Verdict engine
//!
//! Maps the execution score to a verdict tier and assembles the mandatory
//! rule block and next-period commitments. Patterns never touch the score;
//! they only add a warning frame to an Approved week and feed commitments.

use crate::config::{EngineConfig, MAX_CONSUMPTION_PLACEHOLDER};
use crate::types::{
    ActionPlan, ClassifiedActivity, DetectedPattern, PatternKind, Verdict, WeeklyAggregate,
};

impl Verdict {
    /// Report label for the verdict
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Approved => "APPROVED",
            Verdict::AtRisk => "AT RISK",
            Verdict::Failed => "FAILED",
        }
    }

    /// Fixed action template bound to the tier
    pub fn action(&self) -> &'static str {
        match self {
            Verdict::Approved => "maintain cadence, raise complexity.",
            Verdict::AtRisk => "mandatory closure rules for next period",
            Verdict::Failed => "halt new consumption; force closure of open loops.",
        }
    }
}

/// Verdict engine bound to a validated configuration
pub struct VerdictEngine<'a> {
    config: &'a EngineConfig,
}

impl<'a> VerdictEngine<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Tier for a score; floors are inclusive.
    pub fn verdict(&self, execution_score: f64) -> Verdict {
        if execution_score >= self.config.approved_score_floor {
            Verdict::Approved
        } else if execution_score >= self.config.at_risk_score_floor {
            Verdict::AtRisk
        } else {
            Verdict::Failed
        }
    }

    /// Full action plan for a scored week
    pub fn plan(
        &self,
        aggregate: &WeeklyAggregate,
        patterns: &[DetectedPattern],
        activities: &[ClassifiedActivity],
    ) -> ActionPlan {
        let verdict = self.verdict(aggregate.execution_score);
        ActionPlan {
            verdict,
            pattern_warning: verdict == Verdict::Approved
                && patterns.len() >= self.config.pattern_warning_threshold,
            action: verdict.action().to_string(),
            mandatory_rules: self.mandatory_rules(verdict),
            commitments: self.commitments(aggregate, patterns, activities),
        }
    }

    /// Fixed rule block keyed by verdict tier
    pub fn mandatory_rules(&self, verdict: Verdict) -> Vec<String> {
        let cap = format!("{}", self.config.max_consumption_pct());
        match verdict {
            Verdict::Approved => vec![
                "Maintain cadence: every session stays tied to a named artifact.".to_string(),
                "Raise complexity: commit to one deliverable larger than anything shipped this week.".to_string(),
                format!("Keep consumption under {cap}% of logged time."),
            ],
            Verdict::AtRisk => self
                .config
                .closure_rules
                .iter()
                .map(|rule| rule.replace(MAX_CONSUMPTION_PLACEHOLDER, &cap))
                .collect(),
            Verdict::Failed => vec![
                "Halt all new consumption: no tutorials, courses, videos or articles next period.".to_string(),
                "Force closure: every open loop listed in section 4 ends in an artifact before anything new starts.".to_string(),
                "Log every session with its artifact or mark it zero-output.".to_string(),
                format!("Consumption may not exceed {cap}% of logged time once closure is done."),
            ],
        }
    }

    /// Concrete commitments derived from patterns and the largest zero-output block.
    ///
    /// Evidence is cited by input entry number, as in the rest of the report.
    pub fn commitments(
        &self,
        aggregate: &WeeklyAggregate,
        patterns: &[DetectedPattern],
        activities: &[ClassifiedActivity],
    ) -> Vec<String> {
        let mut commitments: Vec<String> = patterns
            .iter()
            .map(|p| {
                let records = p
                    .evidence
                    .iter()
                    .filter_map(|&i| activities.get(i))
                    .map(|a| format!("#{}", a.entry_number()))
                    .collect::<Vec<_>>()
                    .join(", ");
                match p.kind {
                    PatternKind::IdleResearch => format!(
                        "Cap research at {} min and follow it with a production block on the same topic ({records}).",
                        self.config.idle_threshold_minutes
                    ),
                    PatternKind::TaskSwitching => {
                        format!("Finish one task before switching; close {records} with a single artifact.")
                    }
                    PatternKind::PerfectionismStall => {
                        format!("Ship the current version of {records} as-is; no further polish until it is published.")
                    }
                    PatternKind::UnclosedLoop => {
                        format!("Close the loop on {records} with a committed artifact before starting new material.")
                    }
                }
            })
            .collect();

        let largest = aggregate
            .zero_output
            .iter()
            .max_by(|a, b| {
                a.duration_minutes
                    .cmp(&b.duration_minutes)
                    .then(b.index.cmp(&a.index))
            });
        if let Some(block) = largest {
            commitments.push(format!(
                "Replace the largest zero-output block ('{}', {} min) with a production session.",
                block.description, block.duration_minutes
            ));
        }

        if commitments.is_empty() {
            commitments.push("Log an artifact for every session next period.".to_string());
        }
        commitments
    }
}
