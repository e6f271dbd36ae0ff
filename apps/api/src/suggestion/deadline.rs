use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::suggestion::tables::{
    DeadlineTable, PriorityThresholds, MAX_CATEGORY_MULTIPLIER, MAX_LEAD_HOURS,
};

/// The suggester's own recommendation next to the user's due date.
/// The user value is carried through untouched and never read by the math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadlineSuggestion {
    pub suggested_deadline: DateTime<Utc>,
    pub user_due_date: Option<DateTime<Utc>>,
}

/// Lead time = bucket hours x category multiplier + capped workload padding.
pub fn suggest_deadline(
    priority_score: f64,
    category: Option<&str>,
    user_due_date: Option<DateTime<Utc>>,
    current_workload: u32,
    now: DateTime<Utc>,
    thresholds: &PriorityThresholds,
    table: &DeadlineTable,
) -> DeadlineSuggestion {
    let bucket = thresholds.bucket(priority_score);
    let base_hours = table.lead_hours_for(bucket) * table.multiplier_for(category);
    let workload_hours = (current_workload as f64 * table.workload_hours_per_task)
        .min(table.max_workload_hours)
        .max(0.0);

    DeadlineSuggestion {
        suggested_deadline: offset_by_hours(now, base_hours + workload_hours),
        user_due_date,
    }
}

/// `now + hours`, at least one minute ahead and never more than the
/// combined table ceilings. Saturates instead of overflowing.
fn offset_by_hours(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    let ceiling_hours = MAX_LEAD_HOURS * MAX_CATEGORY_MULTIPLIER + MAX_LEAD_HOURS;
    let hours = if hours.is_nan() { 0.0 } else { hours.min(ceiling_hours) };
    let minutes = (hours * 60.0).round().max(1.0) as i64;
    Duration::try_minutes(minutes)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPriority;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn suggest(score: f64, category: Option<&str>, workload: u32) -> DateTime<Utc> {
        suggest_deadline(
            score,
            category,
            None,
            workload,
            now(),
            &PriorityThresholds::default(),
            &DeadlineTable::default(),
        )
        .suggested_deadline
    }

    #[test]
    fn test_urgent_is_same_day() {
        let d = suggest(0.9, Some("Work"), 0);
        assert_eq!(d, now() + Duration::hours(4));
        assert_eq!(d.date_naive(), now().date_naive());
    }

    #[test]
    fn test_medium_is_three_days_and_low_is_a_week() {
        assert_eq!(suggest(0.35, None, 0), now() + Duration::days(3));
        assert_eq!(suggest(0.1, None, 0), now() + Duration::days(7));
    }

    #[test]
    fn test_higher_priority_is_strictly_sooner() {
        for category in [None, Some("Work"), Some("Personal"), Some("Made Up")] {
            assert!(suggest(0.9, category, 2) < suggest(0.2, category, 2));
        }
    }

    #[test]
    fn test_category_multiplier_extends_lead_time() {
        assert!(suggest(0.6, Some("Personal"), 0) > suggest(0.6, Some("Work"), 0));
    }

    #[test]
    fn test_workload_padding_is_capped() {
        let table = DeadlineTable::default();
        let capped = suggest(0.6, None, 1_000);
        let expected = now() + Duration::hours(24) + Duration::hours(table.max_workload_hours as i64);
        assert_eq!(capped, expected);
    }

    #[test]
    fn test_oversized_tables_saturate_instead_of_panicking() {
        let mut table = DeadlineTable::default();
        table.lead_hours.insert(TaskPriority::Low, 1e13);
        table.max_workload_hours = f64::INFINITY;
        let d = suggest_deadline(
            0.1,
            None,
            None,
            u32::MAX,
            now(),
            &PriorityThresholds::default(),
            &table,
        );
        assert!(d.suggested_deadline > now());

        let d = offset_by_hours(DateTime::<Utc>::MAX_UTC - Duration::hours(1), 48.0);
        assert_eq!(d, DateTime::<Utc>::MAX_UTC);
        assert_eq!(offset_by_hours(now(), f64::NAN), now() + Duration::minutes(1));
    }

    #[test]
    fn test_user_due_date_passes_through_unread() {
        let due = now() + Duration::days(30);
        let a = suggest_deadline(
            0.9,
            None,
            Some(due),
            0,
            now(),
            &PriorityThresholds::default(),
            &DeadlineTable::default(),
        );
        let b = suggest_deadline(
            0.9,
            None,
            None,
            0,
            now(),
            &PriorityThresholds::default(),
            &DeadlineTable::default(),
        );
        assert_eq!(a.user_due_date, Some(due));
        assert_eq!(a.suggested_deadline, b.suggested_deadline);
    }
}
