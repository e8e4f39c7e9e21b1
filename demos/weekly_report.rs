//! Render a report for a small sample week

use execution_coach::{entries_to_report, ReportFormat};

fn main() {
    let json = r#"[
        { "description": "Implement log parser", "duration_minutes": 120, "artifact": "src/parser.rs", "day_index": 1, "declared_kind": "production" },
        { "description": "Watch YouTube tech review", "duration_minutes": 65, "day_index": 1, "declared_kind": "consumption" },
        { "description": "Research plotting libraries", "duration_minutes": 90, "day_index": 2 },
        { "description": "Matplotlib video walkthrough", "duration_minutes": 40, "artifact": "report.pdf", "day_index": 2, "declared_kind": "both" },
        { "description": "Tweak report styling", "duration_minutes": 45, "day_index": 3 },
        { "description": "Tweak report font and color", "duration_minutes": 50, "day_index": 4 },
        { "description": "Write parser tests", "duration_minutes": 60, "artifact": "tests/parser.rs", "day_index": 5, "declared_kind": "production" },
        { "description": "Break", "duration_minutes": 0, "day_index": 5 }
    ]"#;

    match entries_to_report(json.to_string(), ReportFormat::Markdown) {
        Ok(report) => print!("{report}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}
