//! Report rendering
//!
//! Turns a finished `WeeklyAnalysis` into the six-section Markdown report or
//! its JSON form. Rendering only formats values computed by earlier stages.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::types::{
    ActionPlan, AnalysisOutcome, CategoryLabel, ClassifiedActivity, DetectedPattern,
    WeeklyAggregate, WeeklyAnalysis,
};

/// Output document format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// Report renderer
pub struct ReportRenderer;

impl ReportRenderer {
    /// Render an analysis in the requested format
    pub fn render(analysis: &WeeklyAnalysis, format: ReportFormat) -> Result<String, AuditError> {
        match format {
            ReportFormat::Markdown => Self::render_markdown(analysis),
            ReportFormat::Json => serde_json::to_string_pretty(analysis)
                .map_err(|e| AuditError::RenderError(e.to_string())),
        }
    }

    /// Render the Markdown document
    pub fn render_markdown(analysis: &WeeklyAnalysis) -> Result<String, AuditError> {
        let mut out = String::new();
        write_document(&mut out, analysis).map_err(|e| AuditError::RenderError(e.to_string()))?;
        Ok(out)
    }
}

fn category_title(label: CategoryLabel) -> &'static str {
    match label {
        CategoryLabel::PureConsumption => "Pure consumption",
        CategoryLabel::DirectProduction => "Direct production",
        CategoryLabel::Mixed => "Mixed",
    }
}

fn write_document(out: &mut String, analysis: &WeeklyAnalysis) -> fmt::Result {
    writeln!(out, "# Weekly Execution Report")?;
    writeln!(out)?;
    writeln!(out, "Report ID: `{}`", analysis.report_id)?;
    if let Some(period) = &analysis.period {
        writeln!(out, "Period: {} to {}", period.start, period.end)?;
    }
    writeln!(out, "Entries are cited as #N, their position in the input.")?;
    writeln!(out)?;

    match &analysis.outcome {
        AnalysisOutcome::Scored {
            aggregate,
            patterns,
            plan,
        } => {
            write_summary(out, analysis, aggregate, patterns, plan)?;
            write_score(out, analysis, aggregate, plan)?;
            write_breakdown(out, analysis, aggregate)?;
            write_detection(out, analysis, aggregate, patterns)?;
            write_mandatory_action(out, plan)?;
            write_commitments(out, analysis, plan)?;
        }
        AnalysisOutcome::InsufficientData { reason } => {
            write_insufficient(out, analysis, reason)?;
        }
    }
    Ok(())
}

fn write_summary(
    out: &mut String,
    analysis: &WeeklyAnalysis,
    aggregate: &WeeklyAggregate,
    patterns: &[DetectedPattern],
    plan: &ActionPlan,
) -> fmt::Result {
    writeln!(out, "## 1. Executive Summary")?;
    writeln!(out)?;
    writeln!(
        out,
        "Verdict: **{}**. Execution Score {:.1}/100: {} of {} activities produced a retrievable artifact.",
        plan.verdict.label(),
        aggregate.execution_score,
        aggregate.activities_with_output,
        aggregate.activities_total
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "Logged time: {} min ({:.1} h). Consumption {:.1}%, production {:.1}%, mixed {:.1}%.",
        aggregate.total_minutes,
        aggregate.total_hours(),
        aggregate.percentage(CategoryLabel::PureConsumption),
        aggregate.percentage(CategoryLabel::DirectProduction),
        aggregate.percentage(CategoryLabel::Mixed)
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "Zero-output time: {} min across {} activities. Self-deception patterns detected: {}.",
        aggregate.zero_output_minutes,
        aggregate.zero_output.len(),
        patterns.len()
    )?;
    if let Some(honesty) = analysis
        .self_assessment
        .as_ref()
        .and_then(|s| s.average_honesty)
    {
        writeln!(out)?;
        writeln!(out, "Average self-reported honesty: {honesty:.1}/10.")?;
    }
    if plan.pattern_warning {
        writeln!(out)?;
        writeln!(out, "{}", warning_clause(patterns.len()))?;
    }
    writeln!(out)
}

fn warning_clause(pattern_count: usize) -> String {
    format!(
        "**Warning:** the score clears the approval floor, but {pattern_count} self-deception patterns were detected. Treat this approval as provisional."
    )
}

fn write_score(
    out: &mut String,
    analysis: &WeeklyAnalysis,
    aggregate: &WeeklyAggregate,
    plan: &ActionPlan,
) -> fmt::Result {
    writeln!(out, "## 2. Execution Score")?;
    writeln!(out)?;
    writeln!(out, "- Formula: `(activities_with_output / activities_total) * 100`")?;
    writeln!(
        out,
        "- Calculation: ({} / {}) * 100 = {:.1}",
        aggregate.activities_with_output, aggregate.activities_total, aggregate.execution_score
    )?;
    writeln!(out, "- Classification: **{}**", plan.verdict.label())?;
    if plan.pattern_warning {
        writeln!(out, "- Framing: approved with warning")?;
    }
    writeln!(out)?;

    if analysis.warnings.is_empty() {
        writeln!(out, "Excluded entries: none.")?;
    } else {
        writeln!(out, "Excluded entries ({}):", analysis.warnings.len())?;
        writeln!(out)?;
        write_warnings(out, analysis)?;
    }
    writeln!(out)
}

fn write_warnings(out: &mut String, analysis: &WeeklyAnalysis) -> fmt::Result {
    for warning in &analysis.warnings {
        let description = if warning.description.trim().is_empty() {
            "(no description)"
        } else {
            warning.description.as_str()
        };
        writeln!(
            out,
            "- #{} '{}': {}",
            warning.source_index + 1,
            description,
            warning.reason
        )?;
    }
    Ok(())
}

/// Input entry number of a classified activity
fn entry_number(analysis: &WeeklyAnalysis, index: usize) -> usize {
    analysis
        .activities
        .get(index)
        .map_or(index + 1, ClassifiedActivity::entry_number)
}

fn write_breakdown(
    out: &mut String,
    analysis: &WeeklyAnalysis,
    aggregate: &WeeklyAggregate,
) -> fmt::Result {
    writeln!(out, "## 3. Category Time Breakdown")?;
    writeln!(out)?;
    writeln!(out, "| Category | Minutes | Share |")?;
    writeln!(out, "|---|---:|---:|")?;
    for label in CategoryLabel::ALL {
        writeln!(
            out,
            "| {} | {} | {:.1}% |",
            category_title(label),
            aggregate.minutes(label),
            aggregate.percentage(label)
        )?;
    }
    writeln!(
        out,
        "| Total | {} ({:.1} h) | |",
        aggregate.total_minutes,
        aggregate.total_hours()
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "Shares are rounded independently to one decimal and may not sum to exactly 100%."
    )?;
    writeln!(out)?;

    writeln!(out, "### Daily scores")?;
    writeln!(out)?;
    writeln!(out, "| Day | Activities | With output | Minutes | Score |")?;
    writeln!(out, "|---:|---:|---:|---:|---:|")?;
    for day in &aggregate.daily {
        writeln!(
            out,
            "| {} | {} | {} | {} | {:.1} |",
            day.day_index, day.activities, day.activities_with_output, day.minutes, day.execution_score
        )?;
    }
    writeln!(out)?;

    writeln!(out, "### Zero-output activities")?;
    writeln!(out)?;
    if aggregate.zero_output.is_empty() {
        writeln!(out, "None.")?;
    } else {
        for entry in &aggregate.zero_output {
            writeln!(
                out,
                "- #{} {} (day {}): {} min",
                entry_number(analysis, entry.index),
                entry.description,
                entry.day_index,
                entry.duration_minutes
            )?;
        }
        writeln!(out)?;
        writeln!(out, "Total zero-output time: {} min.", aggregate.zero_output_minutes)?;
    }
    writeln!(out)
}

fn write_detection(
    out: &mut String,
    analysis: &WeeklyAnalysis,
    aggregate: &WeeklyAggregate,
    patterns: &[DetectedPattern],
) -> fmt::Result {
    writeln!(out, "## 4. Self-Deception Detection")?;
    writeln!(out)?;
    if patterns.is_empty() {
        writeln!(out, "No self-deception patterns detected.")?;
        writeln!(out)?;
    }
    for (n, pattern) in patterns.iter().enumerate() {
        writeln!(out, "### 4.{} {}", n + 1, pattern.kind.title())?;
        writeln!(out)?;
        writeln!(out, "{}.", pattern.justification.trim_end_matches('.'))?;
        writeln!(out)?;
        for &i in &pattern.evidence {
            if let Some(activity) = analysis.activities.get(i) {
                writeln!(
                    out,
                    "- #{} {} (day {}, {} min)",
                    activity.entry_number(),
                    activity.record.description,
                    activity.record.day_index,
                    activity.record.duration_minutes
                )?;
            }
        }
        writeln!(out)?;
    }

    if !aggregate.declared_production_without_output.is_empty() {
        writeln!(out, "### Declared production without output")?;
        writeln!(out)?;
        for &i in &aggregate.declared_production_without_output {
            if let Some(activity) = analysis.activities.get(i) {
                writeln!(
                    out,
                    "- #{} {} was logged as production but left no artifact",
                    activity.entry_number(),
                    activity.record.description
                )?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_mandatory_action(out: &mut String, plan: &ActionPlan) -> fmt::Result {
    writeln!(out, "## 5. Mandatory Action for Next Period")?;
    writeln!(out)?;
    writeln!(out, "Verdict **{}**: {}", plan.verdict.label(), plan.action)?;
    writeln!(out)?;
    for (n, rule) in plan.mandatory_rules.iter().enumerate() {
        writeln!(out, "{}. {}", n + 1, rule)?;
    }
    writeln!(out)
}

fn write_commitments(out: &mut String, analysis: &WeeklyAnalysis, plan: &ActionPlan) -> fmt::Result {
    writeln!(out, "## 6. Specific Commitments")?;
    writeln!(out)?;
    for (n, commitment) in plan.commitments.iter().enumerate() {
        writeln!(out, "{}. {}", n + 1, commitment)?;
    }

    if let Some(summary) = &analysis.self_assessment {
        if !summary.commitments.is_empty() {
            writeln!(out)?;
            writeln!(out, "### Carried over from daily self-assessments")?;
            writeln!(out)?;
            for commitment in &summary.commitments {
                writeln!(out, "- {commitment}")?;
            }
        }
        if !summary.obstacles.is_empty() {
            writeln!(out)?;
            writeln!(out, "### Reported obstacles")?;
            writeln!(out)?;
            for obstacle in &summary.obstacles {
                writeln!(out, "- {obstacle}")?;
            }
        }
    }
    Ok(())
}

fn write_insufficient(out: &mut String, analysis: &WeeklyAnalysis, reason: &str) -> fmt::Result {
    writeln!(out, "## Insufficient Data")?;
    writeln!(out)?;
    writeln!(out, "No Execution Score was computed: {reason}.")?;
    writeln!(out)?;
    writeln!(
        out,
        "Accepted activities: {}. Excluded entries: {}.",
        analysis.activities.len(),
        analysis.warnings.len()
    )?;
    if !analysis.warnings.is_empty() {
        writeln!(out)?;
        write_warnings(out, analysis)?;
    }
    Ok(())
}
