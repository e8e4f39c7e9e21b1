//! Production category classification
//!
//! Artifact presence alone decides whether a record produced output. Keyword
//! markers only separate `Mixed` from `DirectProduction` once output is
//! confirmed; without an artifact every record is `PureConsumption`.

use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::types::{ActivityRecord, CategoryLabel, ClassifiedActivity};

/// Deterministic rule-based classifier
pub struct Classifier<'a> {
    config: &'a EngineConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Classify one record.
    pub fn classify(&self, record: ActivityRecord) -> ClassifiedActivity {
        let (label, has_real_output) = self.label_for(
            record.duration_minutes,
            record.declared_artifact.as_deref(),
            &record.keywords,
        );
        ClassifiedActivity {
            record,
            label,
            has_real_output,
        }
    }

    /// Classify every record, preserving order.
    pub fn classify_all(&self, records: Vec<ActivityRecord>) -> Vec<ClassifiedActivity> {
        records.into_iter().map(|r| self.classify(r)).collect()
    }

    /// Pure labeling rule over `(duration, artifact, keywords)`.
    ///
    /// Duration takes part in the signature but not in the decision.
    pub fn label_for(
        &self,
        _duration_minutes: u32,
        artifact: Option<&str>,
        keywords: &BTreeSet<String>,
    ) -> (CategoryLabel, bool) {
        let has_real_output = artifact.is_some_and(|a| !a.trim().is_empty());
        if !has_real_output {
            return (CategoryLabel::PureConsumption, false);
        }

        if matches_any(keywords, &self.config.consumption_keywords) {
            (CategoryLabel::Mixed, true)
        } else {
            (CategoryLabel::DirectProduction, true)
        }
    }
}

/// Case-insensitive substring match of one marker against a keyword set.
///
/// Multi-word markers ("design tweak") match when every word is found.
pub fn matches_marker(keywords: &BTreeSet<String>, marker: &str) -> bool {
    let mut parts = marker.split_whitespace().peekable();
    if parts.peek().is_none() {
        return false;
    }
    parts.all(|part| {
        let part = part.to_lowercase();
        keywords.iter().any(|k| k.contains(&part))
    })
}

/// True when any marker of the set matches
pub fn matches_any(keywords: &BTreeSet<String>, markers: &BTreeSet<String>) -> bool {
    markers.iter().any(|m| matches_marker(keywords, m))
}

/// Markers of the set that match, in set order
pub fn matched_markers<'m>(keywords: &BTreeSet<String>, markers: &'m BTreeSet<String>) -> Vec<&'m str> {
    markers
        .iter()
        .filter(|m| matches_marker(keywords, m))
        .map(String::as_str)
        .collect()
}
