//! End-to-end scenarios over the public pipeline API

use std::fs;

use execution_coach::schema::LogAdapter;
use execution_coach::types::{DeclaredKind, RawEntry};
use execution_coach::{
    AnalysisOutcome, CategoryLabel, EngineConfig, ExecutionEngine, ReportFormat, Verdict,
};
use pretty_assertions::assert_eq;

/// 23 activities, 14 with output; 535 / 455 / 15 minutes.
fn example_week() -> Vec<RawEntry> {
    let mut entries = Vec::new();

    let production = [
        ("Implement log parser", "src/parser.py"),
        ("Write unit tests for parser", "tests/test_parser.py"),
        ("Refactor report module", "commit 3f2a1c9"),
        ("Draft weekly summary post", "drafts/summary.md"),
        ("Build CSV exporter", "src/export.py"),
        ("Fix date handling bug", "commit 91bd0e2"),
        ("Implement score calculator", "src/score.py"),
        ("Write configuration loader", "src/config.py"),
        ("Build chart generator", "charts/week.png"),
        ("Script data cleanup", "scripts/clean.sh"),
        ("Deploy dashboard prototype", "https://example.org/dash"),
        ("Publish changelog", "CHANGELOG.md"),
        ("Implement pattern report", "src/patterns.py"),
    ];
    for (n, (description, artifact)) in production.iter().enumerate() {
        let day = (n % 7) as u8 + 1;
        entries.push(
            RawEntry::new(description, 35, Some(artifact), day).with_kind(DeclaredKind::Production),
        );
    }

    entries.push(
        RawEntry::new("Matplotlib video notes", 15, Some("notes/plots.md"), 3)
            .with_kind(DeclaredKind::Both),
    );

    let consumption = [
        ("Watch YouTube tech review", 60),
        ("Python tutorial series", 60),
        ("Podcast on productivity", 60),
        ("Browse framework comparisons", 60),
        ("Online course module three", 60),
        ("Lecture recording on statistics", 60),
        ("Article on async patterns", 60),
        ("Video about software design", 60),
        ("Read newsletter backlog", 55),
    ];
    for (n, (description, minutes)) in consumption.iter().enumerate() {
        let day = (n % 7) as u8 + 1;
        entries.push(RawEntry::new(description, *minutes, Some("none"), day));
    }

    entries
}

#[test]
fn example_week_scores_at_risk() {
    let analysis = ExecutionEngine::with_defaults().analyze(&example_week());
    let aggregate = analysis.aggregate().unwrap();

    assert_eq!(aggregate.activities_total, 23);
    assert_eq!(aggregate.activities_with_output, 14);
    assert_eq!(aggregate.execution_score, 60.9);
    assert_eq!(analysis.verdict(), Some(Verdict::AtRisk));

    assert_eq!(aggregate.total_minutes, 1005);
    assert_eq!(aggregate.minutes(CategoryLabel::PureConsumption), 535);
    assert_eq!(aggregate.minutes(CategoryLabel::DirectProduction), 455);
    assert_eq!(aggregate.minutes(CategoryLabel::Mixed), 15);

    assert_eq!(aggregate.percentage(CategoryLabel::PureConsumption), 53.2);
    assert_eq!(aggregate.percentage(CategoryLabel::DirectProduction), 45.3);
    assert_eq!(aggregate.percentage(CategoryLabel::Mixed), 1.5);

    let category_sum: u64 = aggregate.minutes_by_category.values().sum();
    assert_eq!(category_sum, aggregate.total_minutes);

    assert_eq!(aggregate.zero_output.len(), 9);
    assert_eq!(aggregate.zero_output_minutes, 535);
}

#[test]
fn example_week_markdown_shows_computed_fields() {
    let markdown = ExecutionEngine::with_defaults()
        .report(&example_week(), ReportFormat::Markdown)
        .unwrap();

    assert!(markdown.contains("Verdict: **AT RISK**"));
    assert!(markdown.contains("- Calculation: (14 / 23) * 100 = 60.9"));
    assert!(markdown.contains("Logged time: 1005 min (16.8 h)"));
    assert!(markdown.contains("| Pure consumption | 535 | 53.2% |"));
    assert!(markdown.contains("| Direct production | 455 | 45.3% |"));
    assert!(markdown.contains("| Mixed | 15 | 1.5% |"));
    assert!(markdown.contains("Consumption may not exceed 40% of logged time."));
    assert!(markdown.contains("Total zero-output time: 535 min."));
}

#[test]
fn report_is_idempotent() {
    let engine = ExecutionEngine::with_defaults();
    let entries = example_week();

    let first = engine.report(&entries, ReportFormat::Markdown).unwrap();
    let second = engine.report(&entries, ReportFormat::Markdown).unwrap();
    assert_eq!(first, second);

    let first_json = engine.report(&entries, ReportFormat::Json).unwrap();
    let second_json = engine.report(&entries, ReportFormat::Json).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn invalid_record_is_excluded_without_corrupting_totals() {
    let engine = ExecutionEngine::with_defaults();
    let baseline = engine.analyze(&example_week());

    let mut entries = example_week();
    entries.insert(5, RawEntry::new("Coffee break", 0, None, 2));
    let analysis = engine.analyze(&entries);

    assert_eq!(analysis.warnings.len(), 1);
    assert_eq!(analysis.warnings[0].source_index, 5);

    let aggregate = analysis.aggregate().unwrap();
    let expected = baseline.aggregate().unwrap();
    assert_eq!(aggregate.activities_total, 23);
    assert_eq!(aggregate.total_minutes, expected.total_minutes);
    assert_eq!(aggregate.minutes_by_category, expected.minutes_by_category);
    assert_eq!(aggregate.execution_score, expected.execution_score);

    let markdown = engine.report(&entries, ReportFormat::Markdown).unwrap();
    assert!(markdown.contains("Excluded entries (1):"));
    assert!(markdown.contains("'Coffee break': duration must be positive, got 0"));
}

#[test]
fn verdict_tiers_through_pipeline() {
    fn week(with_output: usize) -> Vec<RawEntry> {
        (0..10)
            .map(|n| {
                let artifact = (n < with_output).then_some("out.txt");
                RawEntry::new(&format!("Session {n}"), 30, artifact, 1)
            })
            .collect()
    }

    let engine = ExecutionEngine::with_defaults();
    assert_eq!(engine.analyze(&week(7)).verdict(), Some(Verdict::Approved));
    assert_eq!(engine.analyze(&week(4)).verdict(), Some(Verdict::AtRisk));
    assert_eq!(engine.analyze(&week(3)).verdict(), Some(Verdict::Failed));
}

#[test]
fn toml_config_changes_floors() {
    let config = EngineConfig::from_toml(
        r#"
        approved_score_floor = 60.0
        at_risk_score_floor = 30.0
        "#,
    )
    .unwrap();
    let engine = ExecutionEngine::new(config).unwrap();

    let analysis = engine.analyze(&example_week());
    assert_eq!(analysis.verdict(), Some(Verdict::Approved));
}

#[test]
fn week_directory_feeds_period_and_commitments() {
    let dir = tempfile::tempdir().unwrap();
    let days = [
        ("2026-01-12", "Implement importer", "src/import.rs", 8, "Finish the importer"),
        ("2026-01-13", "Watch tutorial on parsing", "none", 6, "No videos before noon"),
        ("2026-01-15", "Write importer tests", "tests/import.rs", 9, "Ship release notes"),
    ];
    for (date, activity, output, honesty, commitment) in days {
        let log = format!(
            r#"{{
                "date": "{date}",
                "activities": [
                    {{"name": "{activity}", "duration_minutes": 60, "output_produced": "{output}"}}
                ],
                "self_assessment": {{"honesty_score": {honesty}, "main_obstacle": "Context switching", "commitment_tomorrow": "{commitment}"}}
            }}"#
        );
        fs::write(dir.path().join(format!("{date}.json")), log).unwrap();
    }
    fs::write(dir.path().join("2026-01-14.json"), r#"{"date": "2026-01-14", "activities": []}"#)
        .unwrap();

    let week = LogAdapter::load_dir(dir.path()).unwrap();
    assert_eq!(week.rejected_files().len(), 1);

    let engine = ExecutionEngine::with_defaults();
    let analysis = engine.analyze_week(&week);

    let period = analysis.period.unwrap();
    assert_eq!(period.start.to_string(), "2026-01-12");
    assert_eq!(period.end.to_string(), "2026-01-15");

    let aggregate = analysis.aggregate().unwrap();
    assert_eq!(aggregate.activities_total, 3);
    assert_eq!(aggregate.execution_score, 66.7);
    let days: Vec<u8> = aggregate.daily.iter().map(|d| d.day_index).collect();
    assert_eq!(days, vec![1, 2, 4]);

    let summary = analysis.self_assessment.as_ref().unwrap();
    assert_eq!(summary.average_honesty, Some(7.7));

    let markdown = execution_coach::ReportRenderer::render(&analysis, ReportFormat::Markdown).unwrap();
    assert!(markdown.contains("Period: 2026-01-12 to 2026-01-15"));
    assert!(markdown.contains("- Ship release notes"));
    assert!(markdown.contains("Average self-reported honesty: 7.7/10."));
}

#[test]
fn concurrent_runs_are_isolated() {
    let engine = ExecutionEngine::with_defaults();
    let weeks = vec![
        example_week(),
        vec![RawEntry::new("Implement exporter", 90, Some("src/export.rs"), 1)],
        vec![RawEntry::new("Watch conference talk video", 120, None, 2)],
    ];
    let expected: Vec<String> = weeks
        .iter()
        .map(|w| engine.report(w, ReportFormat::Json).unwrap())
        .collect();

    let engine = &engine;
    std::thread::scope(|s| {
        let handles: Vec<_> = weeks
            .iter()
            .map(|w| s.spawn(move || engine.report(w, ReportFormat::Json).unwrap()))
            .collect();
        let actual: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(actual, expected);
    });
}

#[test]
fn empty_week_renders_insufficient_data() {
    let engine = ExecutionEngine::with_defaults();
    let analysis = engine.analyze(&[RawEntry::new("Idle", -5, None, 1)]);

    assert!(matches!(
        analysis.outcome,
        AnalysisOutcome::InsufficientData { .. }
    ));

    let markdown = engine
        .report(&[RawEntry::new("Idle", -5, None, 1)], ReportFormat::Markdown)
        .unwrap();
    assert!(markdown.contains("## Insufficient Data"));
    assert!(!markdown.contains("## 2. Execution Score"));
}

#[test]
fn malformed_entries_become_warnings() {
    let entries = LogAdapter::parse_array(
        r#"[
            {"description": "Implement exporter", "duration_minutes": 90, "artifact": "src/export.rs", "day_index": 1},
            {"duration_minutes": 30, "day_index": 1},
            {"description": "Coding", "duration_minutes": 30, "day_index": 300},
            {"description": "Podcast", "duration_minutes": 20, "day_index": -1},
            {"description": "Reading", "duration_minutes": 12.5, "day_index": 2}
        ]"#,
    )
    .unwrap();

    let analysis = ExecutionEngine::with_defaults().analyze(&entries);

    let rejected: Vec<usize> = analysis.warnings.iter().map(|w| w.source_index).collect();
    assert_eq!(rejected, vec![1, 2, 3, 4]);
    let aggregate = analysis.aggregate().unwrap();
    assert_eq!(aggregate.activities_total, 1);
    assert_eq!(aggregate.execution_score, 100.0);
}

#[test]
fn empty_inputs_render_insufficient_data() {
    let engine = ExecutionEngine::with_defaults();

    let entries = LogAdapter::parse_array("[]").unwrap();
    let markdown = engine.report(&entries, ReportFormat::Markdown).unwrap();
    assert!(markdown.contains("## Insufficient Data"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"date": "2026-01-12", "activities": []}"#).unwrap();
    let week = LogAdapter::load_file(&path).unwrap();

    let analysis = engine.analyze_week(&week);
    match &analysis.outcome {
        AnalysisOutcome::InsufficientData { reason } => assert!(reason.contains("bad.json")),
        other => panic!("expected insufficient data, got {other:?}"),
    }
    let markdown = execution_coach::ReportRenderer::render(&analysis, ReportFormat::Markdown).unwrap();
    assert!(markdown.contains("no valid daily logs (1 rejected: "));
}

#[test]
fn report_cites_entries_by_input_position() {
    let entries = vec![
        RawEntry::new("Parser prototype", 20, None, 3),
        RawEntry::new("Inbox cleanup", 15, Some("inbox-zero.txt"), 1),
        RawEntry::new("Parser prototype again", 25, None, 3),
    ];
    let analysis = ExecutionEngine::with_defaults().analyze(&entries);

    let plan = analysis.plan().unwrap();
    assert!(plan.commitments[0].contains("close #1, #3 with a single artifact"));

    let markdown = execution_coach::ReportRenderer::render(&analysis, ReportFormat::Markdown).unwrap();
    assert!(markdown.contains("- #1 Parser prototype (day 3, 20 min)"));
    assert!(markdown.contains("- #3 Parser prototype again (day 3, 25 min)"));
}
