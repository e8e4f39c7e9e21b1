//! Self-deception pattern detection
//!
//! Scans the day-ordered classified sequence for procrastination signatures.
//! Task identity comes from "subject" keywords: the keywords of a record that
//! are not themselves consumption, research, refinement or production markers.
//! Two records belong to the same task when their subject sets intersect
//! (exact token equality).
//!
//! A keyword → record index is built once per run and discarded afterwards,
//! so clustering never rescans the full sequence per pair.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::classifier::{matched_markers, matches_any};
use crate::config::EngineConfig;
use crate::types::{CategoryLabel, ClassifiedActivity, DeclaredKind, DetectedPattern, PatternKind};

/// Pattern detector over one week's classified activities
pub struct PatternDetector<'a> {
    config: &'a EngineConfig,
}

impl<'a> PatternDetector<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Run every pattern check. Output is ordered by pattern kind, then by
    /// the first record of each instance.
    pub fn detect(&self, activities: &[ClassifiedActivity]) -> Vec<DetectedPattern> {
        let index = KeywordIndex::build(activities, self.config);

        let mut patterns = Vec::new();
        patterns.extend(self.idle_research(activities, &index));
        patterns.extend(self.task_switching(activities, &index));
        patterns.extend(self.perfectionism_stalls(activities, &index));
        patterns.extend(self.unclosed_loops(activities, &index));

        debug!(
            records = activities.len(),
            patterns = patterns.len(),
            "pattern detection finished"
        );
        patterns
    }

    /// Long research/exploration sessions without same-day production on the topic
    fn idle_research(
        &self,
        activities: &[ClassifiedActivity],
        index: &KeywordIndex<'_>,
    ) -> Vec<DetectedPattern> {
        let threshold = self.config.idle_threshold_minutes;
        let mut found = Vec::new();

        for (i, activity) in activities.iter().enumerate() {
            let record = &activity.record;
            if activity.label == CategoryLabel::DirectProduction
                || record.duration_minutes <= threshold
                || !matches_any(&record.keywords, &self.config.research_keywords)
            {
                continue;
            }

            let closed_same_day = index.related(i).any(|j| {
                activities[j].label == CategoryLabel::DirectProduction
                    && activities[j].record.day_index == record.day_index
            });
            if closed_same_day {
                continue;
            }

            found.push(DetectedPattern {
                kind: PatternKind::IdleResearch,
                evidence: vec![i],
                justification: format!(
                    "'{}' took {} min on day {} (over the {} min threshold) as research with no same-day production on the topic",
                    record.description, record.duration_minutes, record.day_index, threshold
                ),
            });
        }
        found
    }

    /// Same task picked up repeatedly within one day without a closing artifact
    fn task_switching(
        &self,
        activities: &[ClassifiedActivity],
        index: &KeywordIndex<'_>,
    ) -> Vec<DetectedPattern> {
        let mut clusters = Clusters::new(activities.len());
        for members in index.by_keyword.values() {
            for (pos, &a) in members.iter().enumerate() {
                for &b in &members[pos + 1..] {
                    if activities[a].record.day_index == activities[b].record.day_index {
                        clusters.union(a, b);
                    }
                }
            }
        }

        let candidates: Vec<usize> = (0..activities.len())
            .filter(|&i| !index.subjects[i].is_empty())
            .collect();

        clusters
            .groups(&candidates)
            .into_iter()
            .filter(|group| group.len() >= 2)
            .filter(|group| {
                !group.iter().any(|&i| {
                    activities[i].label == CategoryLabel::DirectProduction
                        && activities[i].has_real_output
                })
            })
            .map(|group| {
                let day = activities[group[0]].record.day_index;
                let terms = index.shared_terms(&group);
                DetectedPattern {
                    kind: PatternKind::TaskSwitching,
                    justification: format!(
                        "Day {}: '{}' was started {} times ({} min) without a closing artifact",
                        day,
                        terms,
                        group.len(),
                        total_minutes(activities, &group)
                    ),
                    evidence: group,
                }
            })
            .collect()
    }

    /// Repeated refinement/polish sessions across days that never ship
    fn perfectionism_stalls(
        &self,
        activities: &[ClassifiedActivity],
        index: &KeywordIndex<'_>,
    ) -> Vec<DetectedPattern> {
        let refinement = &self.config.refinement_keywords;
        let candidates: Vec<usize> = activities
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                a.label != CategoryLabel::DirectProduction
                    && matches_any(&a.record.keywords, refinement)
            })
            .map(|(i, _)| i)
            .collect();
        if candidates.len() < 2 {
            return Vec::new();
        }

        let mut clusters = Clusters::new(activities.len());
        let mut by_marker: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for &i in &candidates {
            for marker in matched_markers(&activities[i].record.keywords, refinement) {
                by_marker.entry(marker).or_default().push(i);
            }
            for j in index.related(i) {
                if candidates.contains(&j) {
                    clusters.union(i, j);
                }
            }
        }
        for members in by_marker.values() {
            for pair in members.windows(2) {
                clusters.union(pair[0], pair[1]);
            }
        }

        let mut found = Vec::new();
        for group in clusters.groups(&candidates) {
            let days: BTreeSet<u8> = group
                .iter()
                .map(|&i| activities[i].record.day_index)
                .collect();
            if group.len() < 2 || days.len() < 2 {
                continue;
            }

            let markers: BTreeSet<&str> = group
                .iter()
                .flat_map(|&i| matched_markers(&activities[i].record.keywords, refinement))
                .collect();
            let subjects: BTreeSet<&str> = group
                .iter()
                .flat_map(|&i| index.subjects[i].iter().copied())
                .collect();

            let shipped = activities.iter().enumerate().any(|(j, a)| {
                a.label == CategoryLabel::DirectProduction
                    && (markers
                        .iter()
                        .any(|m| matched_markers(&a.record.keywords, refinement).contains(m))
                        || index.subjects[j].iter().any(|k| subjects.contains(k)))
            });
            if shipped {
                continue;
            }

            let cluster_terms = markers
                .iter()
                .chain(subjects.iter())
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            found.push(DetectedPattern {
                kind: PatternKind::PerfectionismStall,
                justification: format!(
                    "'{}' was refined in {} sessions over {} days ({} min) with no production record for it by week's end",
                    cluster_terms,
                    group.len(),
                    days.len(),
                    total_minutes(activities, &group)
                ),
                evidence: group,
            });
        }
        found
    }

    /// Production-intended tasks that never reach an artifact
    fn unclosed_loops(
        &self,
        activities: &[ClassifiedActivity],
        index: &KeywordIndex<'_>,
    ) -> Vec<DetectedPattern> {
        let last_day = activities
            .iter()
            .map(|a| a.record.day_index)
            .max()
            .unwrap_or(0);

        let mut clusters = Clusters::new(activities.len());
        for members in index.by_keyword.values() {
            for pair in members.windows(2) {
                clusters.union(pair[0], pair[1]);
            }
        }

        let candidates: Vec<usize> = (0..activities.len())
            .filter(|&i| !index.subjects[i].is_empty())
            .collect();

        clusters
            .groups(&candidates)
            .into_iter()
            .filter(|group| !group.iter().any(|&i| activities[i].has_real_output))
            .filter(|group| {
                group.iter().any(|&i| {
                    let record = &activities[i].record;
                    record.declared_kind == Some(DeclaredKind::Production)
                        || matches_any(&record.keywords, &self.config.production_keywords)
                })
            })
            .map(|group| {
                let terms = index.shared_terms(&group);
                DetectedPattern {
                    kind: PatternKind::UnclosedLoop,
                    justification: format!(
                        "Task '{}' has {} record(s) ({} min) and never produced an artifact by day {}",
                        terms,
                        group.len(),
                        total_minutes(activities, &group),
                        last_day
                    ),
                    evidence: group,
                }
            })
            .collect()
    }
}

/// Inflections of a marker that still count as the marker itself
const MARKER_SUFFIXES: &[&str] = &["s", "es", "d", "ed", "ing"];

/// True when `word` is `marker` or one of its plain inflections.
///
/// "reading" and "tutorials" are marker forms; "thread" and "designer" are
/// distinct words that merely contain one.
fn is_marker_form(word: &str, marker: &str) -> bool {
    if word == marker {
        return true;
    }
    let stems = [Some(marker), marker.strip_suffix('e')];
    stems.into_iter().flatten().any(|stem| {
        word.strip_prefix(stem)
            .is_some_and(|rest| MARKER_SUFFIXES.contains(&rest))
    })
}

/// Subject keyword index built once per run
struct KeywordIndex<'r> {
    /// Subject keywords per record, parallel to the activity slice
    subjects: Vec<BTreeSet<&'r str>>,
    /// Subject keyword → ascending record indices
    by_keyword: BTreeMap<&'r str, Vec<usize>>,
}

impl<'r> KeywordIndex<'r> {
    fn build(activities: &'r [ClassifiedActivity], config: &EngineConfig) -> Self {
        let marker_words: BTreeSet<&str> = [
            &config.consumption_keywords,
            &config.research_keywords,
            &config.refinement_keywords,
            &config.production_keywords,
        ]
        .into_iter()
        .flatten()
        .flat_map(|m| m.split_whitespace())
        .collect();

        let subjects: Vec<BTreeSet<&str>> = activities
            .iter()
            .map(|a| {
                a.record
                    .keywords
                    .iter()
                    .map(String::as_str)
                    .filter(|k| !marker_words.iter().any(|m| is_marker_form(k, m)))
                    .collect()
            })
            .collect();

        let mut by_keyword: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, keys) in subjects.iter().enumerate() {
            for key in keys {
                by_keyword.entry(*key).or_default().push(i);
            }
        }

        Self {
            subjects,
            by_keyword,
        }
    }

    /// Records sharing at least one subject keyword with `i`, excluding `i`
    fn related(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        let related: BTreeSet<usize> = self.subjects[i]
            .iter()
            .filter_map(|k| self.by_keyword.get(k))
            .flatten()
            .copied()
            .filter(|&j| j != i)
            .collect();
        related.into_iter()
    }

    /// Keywords shared by at least two members, or all subjects when none repeat
    fn shared_terms(&self, members: &[usize]) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for &i in members {
            for key in &self.subjects[i] {
                *counts.entry(*key).or_insert(0) += 1;
            }
        }
        let shared: Vec<&str> = counts
            .iter()
            .filter(|(_, n)| **n >= 2)
            .map(|(k, _)| *k)
            .collect();
        if shared.is_empty() {
            counts.keys().copied().collect::<Vec<_>>().join(", ")
        } else {
            shared.join(", ")
        }
    }
}

/// Union-find over record indices
struct Clusters {
    parent: Vec<usize>,
}

impl Clusters {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // smaller index stays root so group order is stable
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }

    /// Partition `members` by root; groups and their members are ascending
    fn groups(&mut self, members: &[usize]) -> Vec<Vec<usize>> {
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &i in members {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }
        let mut groups: Vec<Vec<usize>> = by_root.into_values().collect();
        for group in &mut groups {
            group.sort_unstable();
        }
        groups.sort_by_key(|g| g[0]);
        groups
    }
}

fn total_minutes(activities: &[ClassifiedActivity], members: &[usize]) -> u64 {
    members
        .iter()
        .map(|&i| u64::from(activities[i].record.duration_minutes))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::normalizer::RecordNormalizer;
    use crate::types::RawEntry;

    fn classify(entries: &[RawEntry]) -> Vec<ClassifiedActivity> {
        let config = EngineConfig::default();
        let (records, warnings) = RecordNormalizer::normalize_all(entries);
        assert!(warnings.is_empty());
        Classifier::new(&config).classify_all(records)
    }

    fn detect(entries: &[RawEntry]) -> Vec<DetectedPattern> {
        let config = EngineConfig::default();
        PatternDetector::new(&config).detect(&classify(entries))
    }

    fn kinds(patterns: &[DetectedPattern], kind: PatternKind) -> Vec<&DetectedPattern> {
        patterns.iter().filter(|p| p.kind == kind).collect()
    }

    #[test]
    fn test_idle_research_fires_without_same_day_production() {
        let patterns = detect(&[RawEntry::new("Research charting libraries", 45, None, 1)]);

        let idle = kinds(&patterns, PatternKind::IdleResearch);
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].evidence, vec![0]);
        assert!(idle[0].justification.contains("45 min"));
    }

    #[test]
    fn test_idle_research_respects_threshold() {
        // exactly at the threshold is not "exceeding" it
        let patterns = detect(&[RawEntry::new("Research charting libraries", 30, None, 1)]);
        assert!(kinds(&patterns, PatternKind::IdleResearch).is_empty());
    }

    #[test]
    fn test_idle_research_closed_by_same_day_production() {
        let patterns = detect(&[
            RawEntry::new("Research charting libraries", 45, None, 1),
            RawEntry::new("Charting dashboard module", 60, Some("dashboard.py"), 1),
        ]);
        assert!(kinds(&patterns, PatternKind::IdleResearch).is_empty());
    }

    #[test]
    fn test_idle_research_not_closed_by_other_day() {
        let patterns = detect(&[
            RawEntry::new("Research charting libraries", 45, None, 1),
            RawEntry::new("Charting dashboard module", 60, Some("dashboard.py"), 2),
        ]);
        assert_eq!(kinds(&patterns, PatternKind::IdleResearch).len(), 1);
    }

    #[test]
    fn test_task_switching_same_day_without_closure() {
        let patterns = detect(&[
            RawEntry::new("Parser prototype", 20, None, 3),
            RawEntry::new("Email triage", 15, None, 3),
            RawEntry::new("Parser prototype again", 25, None, 3),
        ]);

        let switching = kinds(&patterns, PatternKind::TaskSwitching);
        assert_eq!(switching.len(), 1);
        assert_eq!(switching[0].evidence, vec![0, 2]);
        assert!(switching[0].justification.contains("Day 3"));
        assert!(switching[0].justification.contains("parser"));
    }

    #[test]
    fn test_task_switching_closed_by_direct_production() {
        let patterns = detect(&[
            RawEntry::new("Parser prototype", 20, None, 3),
            RawEntry::new("Parser prototype finished", 25, Some("parser.rs"), 3),
        ]);
        assert!(kinds(&patterns, PatternKind::TaskSwitching).is_empty());
    }

    #[test]
    fn test_task_switching_ignores_other_days() {
        let patterns = detect(&[
            RawEntry::new("Parser prototype", 20, None, 1),
            RawEntry::new("Parser prototype", 25, None, 2),
        ]);
        assert!(kinds(&patterns, PatternKind::TaskSwitching).is_empty());
    }

    #[test]
    fn test_perfectionism_stall_across_days() {
        let patterns = detect(&[
            RawEntry::new("Portfolio styling", 40, None, 1),
            RawEntry::new("Portfolio graphics tweak", 35, None, 3),
        ]);

        let stalls = kinds(&patterns, PatternKind::PerfectionismStall);
        assert_eq!(stalls.len(), 1);
        assert_eq!(stalls[0].evidence, vec![0, 1]);
        assert!(stalls[0].justification.contains("2 days"));
    }

    #[test]
    fn test_perfectionism_stall_needs_two_days() {
        let patterns = detect(&[
            RawEntry::new("Portfolio styling", 40, None, 1),
            RawEntry::new("Portfolio styling", 35, None, 1),
        ]);
        assert!(kinds(&patterns, PatternKind::PerfectionismStall).is_empty());
    }

    #[test]
    fn test_perfectionism_stall_cleared_by_shipping() {
        let patterns = detect(&[
            RawEntry::new("Portfolio styling", 40, None, 1),
            RawEntry::new("Portfolio styling", 35, None, 2),
            RawEntry::new("Portfolio release", 60, Some("https://example.org/portfolio"), 5),
        ]);
        assert!(kinds(&patterns, PatternKind::PerfectionismStall).is_empty());
    }

    #[test]
    fn test_unclosed_loop_for_production_intent() {
        let patterns = detect(&[
            RawEntry::new("Watch invoice generator tutorial", 50, None, 1),
            RawEntry::new("Implement invoice generator", 40, None, 4),
        ]);

        let loops = kinds(&patterns, PatternKind::UnclosedLoop);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].evidence, vec![0, 1]);
        assert!(loops[0].justification.contains("generator, invoice"));
        assert!(loops[0].justification.contains("by day 4"));
    }

    #[test]
    fn test_unclosed_loop_closed_by_any_output() {
        let patterns = detect(&[
            RawEntry::new("Watch invoice generator tutorial", 50, None, 1),
            RawEntry::new("Implement invoice generator", 40, Some("invoice.py"), 4),
        ]);
        assert!(kinds(&patterns, PatternKind::UnclosedLoop).is_empty());
    }

    #[test]
    fn test_pure_consumption_without_intent_is_not_a_loop() {
        let patterns = detect(&[RawEntry::new("Youtube tech news", 65, None, 2)]);
        assert!(kinds(&patterns, PatternKind::UnclosedLoop).is_empty());
    }

    #[test]
    fn test_marker_forms_are_exact_or_inflected() {
        assert!(is_marker_form("reading", "read"));
        assert!(is_marker_form("tutorials", "tutorial"));
        assert!(is_marker_form("coding", "code"));
        assert!(is_marker_form("fixes", "fix"));
        assert!(!is_marker_form("thread", "read"));
        assert!(!is_marker_form("encoder", "code"));
        assert!(!is_marker_form("prefix", "fix"));
        assert!(!is_marker_form("relationship", "ship"));
        assert!(!is_marker_form("designer", "design"));
    }

    #[test]
    fn test_subjects_keep_words_that_contain_markers() {
        let config = EngineConfig::default();
        let activities = classify(&[
            RawEntry::new("Thread pool reading", 20, None, 1),
            RawEntry::new("Encoder prefix table", 20, None, 1),
        ]);
        let index = KeywordIndex::build(&activities, &config);

        let first: Vec<&str> = index.subjects[0].iter().copied().collect();
        assert_eq!(first, vec!["pool", "thread"]);
        let second: Vec<&str> = index.subjects[1].iter().copied().collect();
        assert_eq!(second, vec!["encoder", "prefix", "table"]);
    }

    #[test]
    fn test_repeated_thread_refactor_is_switching_and_unclosed() {
        let patterns = detect(&[
            RawEntry::new("Thread refactor", 30, None, 3),
            RawEntry::new("Thread refactor", 25, None, 3),
        ]);

        let switching = kinds(&patterns, PatternKind::TaskSwitching);
        assert_eq!(switching.len(), 1);
        assert_eq!(switching[0].evidence, vec![0, 1]);
        assert!(switching[0].justification.contains("'thread'"));
        assert_eq!(kinds(&patterns, PatternKind::UnclosedLoop).len(), 1);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let entries = vec![
            RawEntry::new("Research charting libraries", 45, None, 1),
            RawEntry::new("Parser prototype", 20, None, 3),
            RawEntry::new("Parser prototype again", 25, None, 3),
            RawEntry::new("Portfolio styling", 40, None, 1),
            RawEntry::new("Portfolio graphics", 35, None, 4),
        ];
        assert_eq!(detect(&entries), detect(&entries));
    }

    #[test]
    fn test_empty_week_has_no_patterns() {
        let config = EngineConfig::default();
        assert!(PatternDetector::new(&config).detect(&[]).is_empty());
    }
}
