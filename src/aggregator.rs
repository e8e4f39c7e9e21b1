//! Weekly aggregation
//!
//! Sums minutes per category, derives per-category percentages, per-day
//! breakdowns and the Execution Score from the classified sequence.
//!
//! Percentages are rounded independently to one decimal. Their sum can land
//! on 99.9 or 100.1; that is a known rounding artifact and is not reconciled.

use std::collections::BTreeMap;

use crate::error::AuditError;
use crate::types::{
    CategoryLabel, ClassifiedActivity, DailyBreakdown, DeclaredKind, WeeklyAggregate,
    ZeroOutputEntry,
};

/// Aggregator for classified activities
pub struct Aggregator;

impl Aggregator {
    /// Aggregate the full classified sequence of a week.
    ///
    /// Fails with `DivisionUndefined` when there are no activities or no minutes.
    pub fn aggregate(activities: &[ClassifiedActivity]) -> Result<WeeklyAggregate, AuditError> {
        let activities_total = activities.len();
        if activities_total == 0 {
            return Err(AuditError::DivisionUndefined(
                "no valid activities were logged".to_string(),
            ));
        }

        let mut minutes_by_category: BTreeMap<CategoryLabel, u64> =
            CategoryLabel::ALL.iter().map(|l| (*l, 0)).collect();
        let mut total_minutes: u64 = 0;
        let mut activities_with_output = 0;
        let mut zero_output = Vec::new();
        let mut declared_production_without_output = Vec::new();

        for (index, activity) in activities.iter().enumerate() {
            let minutes = u64::from(activity.record.duration_minutes);
            total_minutes += minutes;
            *minutes_by_category.entry(activity.label).or_insert(0) += minutes;

            if activity.has_real_output {
                activities_with_output += 1;
            } else {
                zero_output.push(ZeroOutputEntry {
                    index,
                    description: activity.record.description.clone(),
                    day_index: activity.record.day_index,
                    duration_minutes: activity.record.duration_minutes,
                });
                if activity.record.declared_kind == Some(DeclaredKind::Production) {
                    declared_production_without_output.push(index);
                }
            }
        }

        if total_minutes == 0 {
            return Err(AuditError::DivisionUndefined(
                "logged activities add up to zero minutes".to_string(),
            ));
        }

        let category_percentages = minutes_by_category
            .iter()
            .map(|(label, minutes)| (*label, percentage(*minutes, total_minutes)))
            .collect();

        let zero_output_minutes = zero_output
            .iter()
            .map(|z| u64::from(z.duration_minutes))
            .sum();

        Ok(WeeklyAggregate {
            total_minutes,
            minutes_by_category,
            category_percentages,
            activities_total,
            activities_with_output,
            execution_score: execution_score(activities_with_output, activities_total)?,
            daily: daily_breakdown(activities),
            zero_output,
            zero_output_minutes,
            declared_production_without_output,
        })
    }
}

/// Execution Score: `round(100 * with_output / total, 1)`
pub fn execution_score(with_output: usize, total: usize) -> Result<f64, AuditError> {
    if total == 0 {
        return Err(AuditError::DivisionUndefined(
            "activities_total is zero".to_string(),
        ));
    }
    Ok(round1(100.0 * with_output as f64 / total as f64).clamp(0.0, 100.0))
}

/// Round to one decimal, with ties going away from zero.
///
/// 6.25 becomes 6.3 and -6.25 becomes -6.3; there is no round-half-to-even.
/// Ties only occur on values exactly representable in binary, such as 1/16.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: u64, total: u64) -> f64 {
    round1(part as f64 / total as f64 * 100.0)
}

fn daily_breakdown(activities: &[ClassifiedActivity]) -> Vec<DailyBreakdown> {
    let mut by_day: BTreeMap<u8, (usize, usize, u64)> = BTreeMap::new();
    for activity in activities {
        let entry = by_day.entry(activity.record.day_index).or_insert((0, 0, 0));
        entry.0 += 1;
        if activity.has_real_output {
            entry.1 += 1;
        }
        entry.2 += u64::from(activity.record.duration_minutes);
    }

    by_day
        .into_iter()
        .map(|(day_index, (count, with_output, minutes))| DailyBreakdown {
            day_index,
            activities: count,
            activities_with_output: with_output,
            minutes,
            // count is at least 1 for every day present in the map
            execution_score: round1(100.0 * with_output as f64 / count as f64),
        })
        .collect()
}
