//! Activity record normalization
//!
//! Validates raw entries and converts them into `ActivityRecord`s with
//! lowercase keyword sets. Rejected entries become per-record warnings and are
//! excluded from every later stage.

use std::collections::BTreeSet;

use tracing::warn;

use crate::error::AuditError;
use crate::types::{ActivityRecord, RawEntry, RecordWarning};

/// Artifact value that the daily log format uses for "nothing produced"
const NO_ARTIFACT_SENTINEL: &str = "none";

/// Tokens too common to identify a task
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "at", "for", "from", "in", "into", "of", "on", "or", "the", "to", "with",
];

/// Valid range for `day_index`
const DAY_RANGE: std::ops::RangeInclusive<u8> = 1..=7;

/// Normalizer for raw activity entries
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Validate and normalize a single entry.
    ///
    /// Fails with `InvalidRecord` for an empty description, a duration that is
    /// not a positive whole number of minutes, or a day index outside 1-7.
    pub fn normalize(source_index: usize, raw: &RawEntry) -> Result<ActivityRecord, AuditError> {
        let description = raw.description.trim();
        if description.is_empty() {
            return Err(AuditError::invalid_record(source_index, "description is empty"));
        }

        let minutes = raw.duration_minutes;
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(AuditError::invalid_record(
                source_index,
                format!("duration must be positive, got {}", minutes),
            ));
        }
        if minutes.fract() != 0.0 {
            return Err(AuditError::invalid_record(
                source_index,
                format!("duration must be a whole number of minutes, got {}", minutes),
            ));
        }
        if minutes > f64::from(u32::MAX) {
            return Err(AuditError::invalid_record(
                source_index,
                format!("duration {} is out of range", minutes),
            ));
        }
        let duration_minutes = minutes as u32;

        let day_index = u8::try_from(raw.day_index)
            .ok()
            .filter(|day| DAY_RANGE.contains(day))
            .ok_or_else(|| {
                AuditError::invalid_record(
                    source_index,
                    format!("day_index must be within 1-7, got {}", raw.day_index),
                )
            })?;

        Ok(ActivityRecord {
            source_index,
            description: description.to_string(),
            duration_minutes,
            declared_artifact: normalize_artifact(raw.declared_artifact.as_deref()),
            keywords: extract_keywords(description),
            day_index,
            declared_kind: raw.declared_kind,
        })
    }

    /// Normalize a whole input sequence.
    ///
    /// Invalid entries are reported as warnings, never abort the run. Accepted
    /// records are stably ordered by `day_index`.
    pub fn normalize_all(entries: &[RawEntry]) -> (Vec<ActivityRecord>, Vec<RecordWarning>) {
        let mut records = Vec::with_capacity(entries.len());
        let mut warnings = Vec::new();

        for (idx, raw) in entries.iter().enumerate() {
            match Self::normalize(idx, raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    let reason = match e {
                        AuditError::InvalidRecord { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!(index = idx, %reason, "rejected activity record");
                    warnings.push(RecordWarning {
                        source_index: idx,
                        description: raw.description.trim().to_string(),
                        reason,
                    });
                }
            }
        }

        records.sort_by_key(|r| r.day_index);
        (records, warnings)
    }
}

/// Split text into lowercase tokens, treating punctuation as whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Keyword set for a description: tokens minus stop words and single characters
pub fn extract_keywords(description: &str) -> BTreeSet<String> {
    tokenize(description)
        .into_iter()
        .filter(|t| t.chars().count() > 1 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

fn normalize_artifact(artifact: Option<&str>) -> Option<String> {
    let trimmed = artifact?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_ARTIFACT_SENTINEL) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
