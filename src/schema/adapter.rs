//! Adapter for turning activity logs into raw entries
//!
//! Handles the two front-end formats: flat entry lists (JSON array or NDJSON)
//! and directories of daily log files, which are assembled into a `WeekLog`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregator::round1;
use crate::error::AuditError;
use crate::schema::daily_log::{DailyLog, LogValidationError};
use crate::types::{RawEntry, ReportPeriod, SelfAssessmentSummary};

/// Longest span a single report may cover
const MAX_WEEK_DAYS: i64 = 7;

/// Adapter for parsing activity logs
pub struct LogAdapter;

impl LogAdapter {
    /// Parse a JSON string containing an array of raw entries
    pub fn parse_array(json: &str) -> Result<Vec<RawEntry>, AuditError> {
        let entries: Vec<RawEntry> = serde_json::from_str(json)?;
        Ok(entries)
    }

    /// Parse NDJSON (newline-delimited JSON) containing raw entries
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawEntry>, AuditError> {
        let mut entries = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEntry>(trimmed) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    return Err(AuditError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(entries)
    }

    /// Parse one daily log document
    pub fn parse_daily_log(json: &str) -> Result<DailyLog, AuditError> {
        let log: DailyLog = serde_json::from_str(json)?;
        Ok(log)
    }

    /// Load a single daily log file as a one-day week.
    ///
    /// A file that cannot be parsed or validated yields an empty week with the
    /// file listed in `WeekLog::rejected_files`; only read failures are errors.
    pub fn load_file(path: &Path) -> Result<WeekLog, AuditError> {
        Self::daily_log_week(&fs::read_to_string(path)?, path)
    }

    /// One-day week from daily log text already in memory; `origin` names
    /// the source in a rejection.
    pub fn daily_log_week(content: &str, origin: &Path) -> Result<WeekLog, AuditError> {
        match Self::validated_day(content) {
            Ok(day) => WeekLog::from_days(vec![day], Vec::new()),
            Err(e) => {
                warn!(path = %origin.display(), error = %e, "skipping daily log");
                WeekLog::from_days(Vec::new(), vec![FileIssue::new(origin, &e)])
            }
        }
    }

    /// Load every `*.json` daily log in a directory, sorted by file name.
    ///
    /// Files that fail to parse or validate are skipped and reported in
    /// `WeekLog::rejected_files`; the remaining days form the week.
    pub fn load_dir(dir: &Path) -> Result<WeekLog, AuditError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut days = Vec::new();
        let mut rejected = Vec::new();

        for path in paths {
            let loaded = fs::read_to_string(&path)
                .map_err(AuditError::from)
                .and_then(|content| Self::validated_day(&content));

            match loaded {
                Ok(day) => days.push(day),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping daily log");
                    rejected.push(FileIssue::new(&path, &e));
                }
            }
        }

        debug!(valid = days.len(), rejected = rejected.len(), "loaded daily logs");
        WeekLog::from_days(days, rejected)
    }

    fn validated_day(content: &str) -> Result<(NaiveDate, DailyLog), AuditError> {
        let log = Self::parse_daily_log(content)?;
        Ok((log.validate()?, log))
    }
}

/// A daily log file that could not be used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub error: String,
}

impl FileIssue {
    fn new(path: &Path, error: &AuditError) -> Self {
        Self {
            path: path.to_path_buf(),
            error: error.to_string(),
        }
    }
}

/// Validated daily logs for one week, ordered by date
#[derive(Debug, Clone, PartialEq)]
pub struct WeekLog {
    days: Vec<(NaiveDate, DailyLog)>,
    rejected_files: Vec<FileIssue>,
}

impl WeekLog {
    /// Assemble a week from validated days.
    ///
    /// Fails when the dates span more than seven calendar days.
    pub fn from_days(
        mut days: Vec<(NaiveDate, DailyLog)>,
        rejected_files: Vec<FileIssue>,
    ) -> Result<Self, AuditError> {
        days.sort_by_key(|(date, _)| *date);

        if let (Some((first, _)), Some((last, _))) = (days.first(), days.last()) {
            let span = (*last - *first).num_days() + 1;
            if span > MAX_WEEK_DAYS {
                return Err(LogValidationError::SpanTooLong { days: span }.into());
            }
        }

        Ok(Self {
            days,
            rejected_files,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn days(&self) -> &[(NaiveDate, DailyLog)] {
        &self.days
    }

    pub fn rejected_files(&self) -> &[FileIssue] {
        &self.rejected_files
    }

    /// First and last logged date
    pub fn period(&self) -> Option<ReportPeriod> {
        let (start, _) = self.days.first()?;
        let (end, _) = self.days.last()?;
        Some(ReportPeriod {
            start: *start,
            end: *end,
        })
    }

    /// Flatten the logs into raw entries; `day_index` counts from the first date.
    pub fn to_entries(&self) -> Vec<RawEntry> {
        let Some((first, _)) = self.days.first() else {
            return Vec::new();
        };

        self.days
            .iter()
            .flat_map(|(date, log)| {
                // from_days guarantees the span fits in 1..=7
                let day_index = (*date - *first).num_days() + 1;
                log.activities.iter().map(move |activity| RawEntry {
                    description: activity.description.clone(),
                    duration_minutes: activity.duration_minutes,
                    declared_artifact: activity.output_produced.clone(),
                    day_index,
                    declared_kind: activity.kind,
                })
            })
            .collect()
    }

    /// Honesty average, obstacles and commitments in day order
    pub fn self_assessment(&self) -> Option<SelfAssessmentSummary> {
        let assessments: Vec<_> = self
            .days
            .iter()
            .filter_map(|(_, log)| log.self_assessment.as_ref())
            .collect();
        if assessments.is_empty() {
            return None;
        }

        let average = assessments.iter().map(|a| a.honesty_score).sum::<f64>()
            / assessments.len() as f64;

        Some(SelfAssessmentSummary {
            average_honesty: Some(round1(average)),
            obstacles: non_blank(assessments.iter().map(|a| a.main_obstacle.as_deref())),
            commitments: non_blank(assessments.iter().map(|a| a.commitment_tomorrow.as_deref())),
        })
    }
}

fn non_blank<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_json(date: &str, honesty: u8, commitment: &str) -> String {
        format!(
            r#"{{
                "date": "{date}",
                "activities": [
                    {{"name": "Coding", "duration_minutes": 120, "output_produced": "module.py", "type": "production"}},
                    {{"name": "Podcast", "time_invested_minutes": 60, "output_produced": "none", "type": "consumption"}}
                ],
                "self_assessment": {{"honesty_score": {honesty}, "main_obstacle": "Distractions", "commitment_tomorrow": "{commitment}"}}
            }}"#
        )
    }

    #[test]
    fn test_parse_array() {
        let entries = LogAdapter::parse_array(
            r#"[{"description": "Coding", "duration_minutes": 30, "artifact": "a.rs", "day_index": 1}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].declared_artifact.as_deref(), Some("a.rs"));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"description\": \"a\", \"duration_minutes\": 5, \"day_index\": 1}\n\nnot json\n";
        let err = LogAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_load_dir_assigns_day_indices_and_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2026-01-12.json"), day_json("2026-01-12", 8, "Focus")).unwrap();
        fs::write(dir.path().join("2026-01-14.json"), day_json("2026-01-14", 9, "Ship draft")).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let week = LogAdapter::load_dir(dir.path()).unwrap();

        assert_eq!(week.days().len(), 2);
        assert_eq!(week.rejected_files().len(), 1);

        let entries = week.to_entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].day_index, 1);
        assert_eq!(entries[3].day_index, 3);
        assert_eq!(entries[1].declared_artifact.as_deref(), Some("none"));

        let period = week.period().unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());

        let summary = week.self_assessment().unwrap();
        assert_eq!(summary.average_honesty, Some(8.5));
        assert_eq!(summary.commitments, vec!["Focus", "Ship draft"]);
    }

    #[test]
    fn test_span_longer_than_week_rejected() {
        let first: DailyLog = serde_json::from_str(&day_json("2026-01-01", 8, "a")).unwrap();
        let last: DailyLog = serde_json::from_str(&day_json("2026-01-08", 8, "b")).unwrap();
        let result = WeekLog::from_days(
            vec![
                (NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), first),
                (NaiveDate::from_ymd_opt(2026, 1, 8).unwrap(), last),
            ],
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(AuditError::InvalidLog(LogValidationError::SpanTooLong { days: 8 }))
        ));
    }

    #[test]
    fn test_load_file_single_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("day.json");
        fs::write(&path, day_json("2026-01-12", 7, "Start at 9am")).unwrap();

        let week = LogAdapter::load_file(&path).unwrap();
        assert_eq!(week.to_entries().len(), 2);
        assert!(week.rejected_files().is_empty());
    }

    #[test]
    fn test_load_file_keeps_invalid_log_as_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"date": "2026-13-40", "activities": []}"#).unwrap();

        let week = LogAdapter::load_file(&path).unwrap();

        assert!(week.is_empty());
        assert_eq!(week.rejected_files().len(), 1);
        assert_eq!(week.rejected_files()[0].path, path);
        assert!(week.rejected_files()[0].error.contains("2026-13-40"));
    }

    #[test]
    fn test_load_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LogAdapter::load_file(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(AuditError::Io(_))));
    }

    #[test]
    fn test_entry_array_with_malformed_fields_still_parses() {
        let entries = LogAdapter::parse_array(
            r#"[
                {"duration_minutes": 30, "day_index": 1},
                {"description": "Coding", "duration_minutes": 30, "day_index": 300},
                {"description": "Reading", "duration_minutes": 12.5, "day_index": -1}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].day_index, 300);
        assert_eq!(entries[2].duration_minutes, 12.5);
    }
}
