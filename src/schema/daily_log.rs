//! Daily log file schema
//!
//! One JSON document per logged day. Field names accept both the current and
//! the legacy spellings produced by earlier log templates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::DeclaredKind;

/// Date format used by daily logs
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive bounds of the self-reported honesty score
pub const HONESTY_SCORE_RANGE: (f64, f64) = (0.0, 10.0);

/// One day's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    /// Calendar date in `YYYY-MM-DD`
    pub date: String,
    pub activities: Vec<LoggedActivity>,
    #[serde(default, alias = "self_assesment", skip_serializing_if = "Option::is_none")]
    pub self_assessment: Option<SelfAssessment>,
}

/// One activity as written in a daily log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedActivity {
    #[serde(default, alias = "name")]
    pub description: String,
    /// Checked per activity during normalization, not here
    #[serde(default, alias = "time_invested_minutes")]
    pub duration_minutes: f64,
    /// Artifact description, or "none"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_produced: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeclaredKind>,
}

/// End-of-day self-assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfAssessment {
    pub honesty_score: f64,
    #[serde(default, alias = "main_blocker", skip_serializing_if = "Option::is_none")]
    pub main_obstacle: Option<String>,
    #[serde(default, alias = "tomorrow_commitment", skip_serializing_if = "Option::is_none")]
    pub commitment_tomorrow: Option<String>,
}

impl DailyLog {
    /// Validate file-level structure and return the parsed date.
    ///
    /// Activity-level faults (empty description, non-positive duration) are
    /// left to record normalization so they surface as per-record warnings.
    pub fn validate(&self) -> Result<NaiveDate, LogValidationError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT)
            .map_err(|_| LogValidationError::InvalidDate(self.date.clone()))?;

        if self.activities.is_empty() {
            return Err(LogValidationError::NoActivities {
                date: self.date.clone(),
            });
        }

        if let Some(assessment) = &self.self_assessment {
            let (min, max) = HONESTY_SCORE_RANGE;
            if !(min..=max).contains(&assessment.honesty_score) {
                return Err(LogValidationError::HonestyOutOfRange {
                    value: assessment.honesty_score,
                });
            }
        }

        Ok(date)
    }
}

/// Validation errors for daily logs
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogValidationError {
    #[error("date must use YYYY-MM-DD, got '{0}'")]
    InvalidDate(String),

    #[error("log for {date} has no activities")]
    NoActivities { date: String },

    #[error("honesty_score must be between 0 and 10, got {value}")]
    HonestyOutOfRange { value: f64 },

    #[error("log spans {days} days; a week covers at most 7")]
    SpanTooLong { days: i64 },
}
