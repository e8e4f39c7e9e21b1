//! Engine configuration
//!
//! Marker keyword sets and score thresholds are resolved once, before any
//! analysis run, and then shared read-only by every stage.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via `apply_overrides`)
//! 2. TOML file passed to `load`
//! 3. Compiled defaults

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Placeholder substituted into closure rules with the consumption cap in percent
pub const MAX_CONSUMPTION_PLACEHOLDER: &str = "{max_consumption_pct}";

const DEFAULT_CONSUMPTION_KEYWORDS: &[&str] = &[
    "tutorial",
    "video",
    "youtube",
    "read",
    "watch",
    "course",
    "podcast",
    "article",
    "lecture",
    "documentation",
    "browse",
];

const DEFAULT_RESEARCH_KEYWORDS: &[&str] = &[
    "research",
    "testing",
    "explore",
    "exploration",
    "investigate",
    "compare",
    "benchmark",
    "experiment",
];

const DEFAULT_REFINEMENT_KEYWORDS: &[&str] = &[
    "styling",
    "graphics",
    "design",
    "tweak",
    "polish",
    "font",
    "color",
    "layout",
    "theme",
];

const DEFAULT_PRODUCTION_KEYWORDS: &[&str] = &[
    "write",
    "build",
    "implement",
    "code",
    "commit",
    "script",
    "fix",
    "deploy",
    "draft",
    "publish",
    "ship",
    "refactor",
];

const DEFAULT_CLOSURE_RULES: &[&str] = &[
    "Consumption may not exceed {max_consumption_pct}% of logged time.",
    "No new tutorial, course or video until the current task has a committed artifact.",
    "Every session ends with a file, commit or published document, or it is logged as zero-output.",
    "Close one open loop per day before starting new material.",
];

/// Configuration for the classifier, pattern detector and verdict engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Tutorial/video/read/watch/course markers. Default: see `DEFAULT_CONSUMPTION_KEYWORDS`.
    pub consumption_keywords: BTreeSet<String>,
    /// Research/testing/exploration markers used by IdleResearch
    pub research_keywords: BTreeSet<String>,
    /// Refinement/polish markers used by PerfectionismStall
    pub refinement_keywords: BTreeSet<String>,
    /// Production-intent markers used to infer tasks that should end in an artifact
    pub production_keywords: BTreeSet<String>,
    /// Minimum duration (exclusive) for a research record to count as idle. Default: 30.
    pub idle_threshold_minutes: u32,
    /// Lowest score that is still Approved. Default: 70.
    pub approved_score_floor: f64,
    /// Lowest score that is still AtRisk. Default: 40.
    pub at_risk_score_floor: f64,
    /// Consumption cap quoted in the mandatory rules; not enforced. Default: 0.40.
    pub max_consumption_ratio: f64,
    /// Pattern count at which an Approved verdict carries a warning. Default: 3.
    pub pattern_warning_threshold: usize,
    /// Mandatory closure rules for an AtRisk week
    pub closure_rules: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consumption_keywords: marker_set(DEFAULT_CONSUMPTION_KEYWORDS),
            research_keywords: marker_set(DEFAULT_RESEARCH_KEYWORDS),
            refinement_keywords: marker_set(DEFAULT_REFINEMENT_KEYWORDS),
            production_keywords: marker_set(DEFAULT_PRODUCTION_KEYWORDS),
            idle_threshold_minutes: 30,
            approved_score_floor: 70.0,
            at_risk_score_floor: 40.0,
            max_consumption_ratio: 0.40,
            pattern_warning_threshold: 3,
            closure_rules: DEFAULT_CLOSURE_RULES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// CLI override arguments that can be applied to a config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub idle_threshold_minutes: Option<u32>,
    pub approved_score_floor: Option<f64>,
    pub at_risk_score_floor: Option<f64>,
    pub max_consumption_ratio: Option<f64>,
}

impl EngineConfig {
    /// Load configuration from an optional TOML file, apply CLI overrides and validate.
    pub fn load(path: Option<&Path>, overrides: Option<&CliOverrides>) -> Result<Self, AuditError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    AuditError::ConfigurationError(format!(
                        "cannot read {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::parse_toml(&content, &path.display().to_string())?
            }
            None => Self::default(),
        };

        if let Some(cli) = overrides {
            config.apply_overrides(cli);
        }

        config.normalize_markers();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, AuditError> {
        let mut config = Self::parse_toml(toml_str, "<string>")?;
        config.normalize_markers();
        config.validate()?;
        Ok(config)
    }

    fn parse_toml(toml_str: &str, origin: &str) -> Result<Self, AuditError> {
        toml::from_str(toml_str)
            .map_err(|e| AuditError::ConfigurationError(format!("{origin}: {e}")))
    }

    /// Apply CLI overrides; only `Some` values replace the current ones.
    pub fn apply_overrides(&mut self, cli: &CliOverrides) {
        if let Some(v) = cli.idle_threshold_minutes {
            self.idle_threshold_minutes = v;
        }
        if let Some(v) = cli.approved_score_floor {
            self.approved_score_floor = v;
        }
        if let Some(v) = cli.at_risk_score_floor {
            self.at_risk_score_floor = v;
        }
        if let Some(v) = cli.max_consumption_ratio {
            self.max_consumption_ratio = v;
        }
    }

    /// Lowercase and trim every marker so matching is case-insensitive.
    pub fn normalize_markers(&mut self) {
        for set in [
            &mut self.consumption_keywords,
            &mut self.research_keywords,
            &mut self.refinement_keywords,
            &mut self.production_keywords,
        ] {
            *set = set.iter().map(|m| m.trim().to_lowercase()).collect();
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), AuditError> {
        let marker_sets = [
            ("consumption_keywords", &self.consumption_keywords),
            ("research_keywords", &self.research_keywords),
            ("refinement_keywords", &self.refinement_keywords),
            ("production_keywords", &self.production_keywords),
        ];
        for (field, set) in marker_sets {
            if set.is_empty() {
                return Err(invalid(field, "must contain at least one marker"));
            }
            if set.iter().any(|m| m.trim().is_empty()) {
                return Err(invalid(field, "markers must not be blank"));
            }
        }

        if self.idle_threshold_minutes == 0 {
            return Err(invalid("idle_threshold_minutes", "must be greater than 0"));
        }
        for (field, floor) in [
            ("approved_score_floor", self.approved_score_floor),
            ("at_risk_score_floor", self.at_risk_score_floor),
        ] {
            if !(0.0..=100.0).contains(&floor) {
                return Err(invalid(field, "must be between 0 and 100"));
            }
        }
        if self.at_risk_score_floor >= self.approved_score_floor {
            return Err(invalid(
                "at_risk_score_floor",
                "must be lower than approved_score_floor",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_consumption_ratio) {
            return Err(invalid("max_consumption_ratio", "must be between 0.0 and 1.0"));
        }
        if self.pattern_warning_threshold == 0 {
            return Err(invalid("pattern_warning_threshold", "must be greater than 0"));
        }
        if self.closure_rules.iter().any(|r| r.trim().is_empty()) {
            return Err(invalid("closure_rules", "rules must not be blank"));
        }
        Ok(())
    }

    /// Consumption cap as a whole percentage, e.g. `40` for 0.40
    pub fn max_consumption_pct(&self) -> f64 {
        (self.max_consumption_ratio * 100.0).round()
    }
}

fn invalid(field: &str, message: &str) -> AuditError {
    AuditError::ConfigurationError(format!("{field} {message}"))
}

fn marker_set(markers: &[&str]) -> BTreeSet<String> {
    markers.iter().map(|m| m.to_string()).collect()
}
