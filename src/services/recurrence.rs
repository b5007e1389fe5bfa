//! Pure recurrence expansion engine.
//!
//! Expansion is a function of (rule, origin, window) only: no storage
//! access, no hidden state, so repeated calendar reads are idempotent.
//! Malformed rules never panic or error; the item degrades to a single
//! occurrence so calendar rendering always succeeds.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::warn;

use crate::models::{RecurrenceRule, ScheduleItem};

/// Sunday-aligned start of the week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Day-of-week index 0..=6 (0 = Sunday).
pub fn day_of_week(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

/// Expands a weekly recurrence rule into the concrete dates on which it
/// fires inside `[window_start, window_end]` (both inclusive).
///
/// Dates are emitted per week offset `k` from the origin week, for weeks
/// where `k % interval == 0`, on each day in `days_of_week` (falling back
/// to the origin's own weekday when the set is empty). Emitted dates are
/// never before the origin date and never after `ends_on`. The result is
/// ascending and deduplicated. Suppressed dates in `rule.exceptions` are
/// skipped.
pub fn expand_recurrence(
    rule: &RecurrenceRule,
    origin_date: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<NaiveDate> {
    if window_end < window_start {
        return Vec::new();
    }

    if !rule.is_well_formed() {
        warn!(
            frequency = %rule.frequency,
            interval = rule.interval,
            "malformed recurrence rule, treating item as a single occurrence"
        );
        return single_occurrence(rule, origin_date, window_start, window_end);
    }

    let origin_week = week_start_of(origin_date);
    let days: Vec<i64> = if rule.days_of_week.is_empty() {
        vec![day_of_week(origin_date) as i64]
    } else {
        let mut days: Vec<i64> = rule.days_of_week.iter().map(|d| *d as i64).collect();
        days.sort_unstable();
        days.dedup();
        days
    };

    let mut dates = Vec::new();
    let mut k: i64 = 0;
    loop {
        let week = origin_week + Duration::weeks(k);
        if week > window_end {
            break;
        }
        if let Some(ends_on) = rule.ends_on {
            if week > ends_on {
                break;
            }
        }
        if k % rule.interval as i64 == 0 {
            for &d in &days {
                let date = week + Duration::days(d);
                if date < origin_date || date < window_start || date > window_end {
                    continue;
                }
                if rule.ends_on.map_or(false, |e| date > e) {
                    continue;
                }
                if rule.exceptions.contains(&date) {
                    continue;
                }
                dates.push(date);
            }
        }
        k += 1;
    }

    dates.sort_unstable();
    dates.dedup();
    dates
}

fn single_occurrence(
    rule: &RecurrenceRule,
    origin_date: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<NaiveDate> {
    if origin_date >= window_start
        && origin_date <= window_end
        && !rule.exceptions.contains(&origin_date)
    {
        vec![origin_date]
    } else {
        Vec::new()
    }
}

/// Expands one stored item into its concrete entries inside the window.
///
/// Non-recurring items yield themselves when their date falls in the
/// window. Recurring items yield the origin (non-virtual) on its own date
/// and virtual copies everywhere else, each rebased onto the week of its
/// occurrence date.
pub fn expand_item(
    item: &ScheduleItem,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<ScheduleItem> {
    let origin_date = item.occurrence_date();

    let rule = match (item.is_recurring, item.rule()) {
        (true, Some(rule)) => rule.clone(),
        (true, None) => {
            warn!(item_id = %item.id, "recurring item without a rule, treating as one-off");
            RecurrenceRule {
                frequency: "none".to_string(),
                interval: 0,
                ends_on: None,
                days_of_week: Vec::new(),
                exceptions: Vec::new(),
            }
        }
        (false, _) => {
            return if origin_date >= window_start && origin_date <= window_end {
                vec![item.clone()]
            } else {
                Vec::new()
            };
        }
    };

    expand_recurrence(&rule, origin_date, window_start, window_end)
        .into_iter()
        .map(|date| {
            if date == origin_date {
                item.clone()
            } else {
                item.virtual_occurrence(date, week_start_of(date))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};
    use pretty_assertions::assert_eq;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(origin: NaiveDate, rule: Option<RecurrenceRule>) -> ScheduleItem {
        let week_start = week_start_of(origin);
        ScheduleItem {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            week_start,
            item_type: "workout".to_string(),
            title: "Intervals".to_string(),
            day: day_of_week(origin),
            start_time: "07:00".to_string(),
            end_time: None,
            is_recurring: rule.is_some(),
            recurrence: rule.map(Json),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_virtual: false,
            origin_id: None,
        }
    }

    #[test]
    fn weekly_mon_wed_fri_over_four_weeks_yields_twelve() {
        // Jan 1 2024 is a Monday.
        let origin = date(2024, 1, 1);
        let rule = RecurrenceRule::weekly(1, vec![1, 3, 5], None);

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 28));

        assert_eq!(dates.len(), 12);
        for d in &dates {
            assert!(matches!(
                d.weekday(),
                Weekday::Mon | Weekday::Wed | Weekday::Fri
            ));
        }
        assert_eq!(dates.first(), Some(&date(2024, 1, 1)));
    }

    #[test]
    fn interval_two_skips_alternate_weeks() {
        let origin = date(2024, 1, 1);
        let rule = RecurrenceRule::weekly(2, vec![1, 3, 5], None);

        // Eight weeks: only weeks 0, 2, 4, 6 fire.
        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 2, 25));

        assert_eq!(dates.len(), 12);
        // First emitted week is the origin week.
        assert_eq!(dates[0], date(2024, 1, 1));
        assert_eq!(dates[1], date(2024, 1, 3));
        assert_eq!(dates[2], date(2024, 1, 5));
        // Week 1 skipped entirely.
        assert_eq!(dates[3], date(2024, 1, 15));
    }

    #[test]
    fn ends_on_boundary_is_inclusive() {
        let origin = date(2024, 1, 2); // a Tuesday
        let mut rule = RecurrenceRule::weekly(1, vec![2], None);
        // Between the Jan 9 and Jan 16 occurrences.
        rule.ends_on = Some(date(2024, 1, 10));

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 3, 31));

        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 9)]);

        // Landing exactly on an occurrence keeps it.
        rule.ends_on = Some(date(2024, 1, 9));
        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 3, 31));
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 9)]);
    }

    #[test]
    fn empty_days_falls_back_to_origin_weekday() {
        let origin = date(2024, 1, 4); // a Thursday
        let rule = RecurrenceRule::weekly(1, vec![], None);

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 21));

        assert_eq!(
            dates,
            vec![date(2024, 1, 4), date(2024, 1, 11), date(2024, 1, 18)]
        );
    }

    #[test]
    fn never_emits_before_origin_date() {
        // Origin on a Friday, rule also covers Monday of the same week.
        let origin = date(2024, 1, 5);
        let rule = RecurrenceRule::weekly(1, vec![1, 5], None);

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 14));

        assert_eq!(
            dates,
            vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 12)]
        );
    }

    #[test]
    fn malformed_rule_degrades_to_single_occurrence() {
        let origin = date(2024, 1, 3);

        let zero_interval = RecurrenceRule::weekly(0, vec![3], None);
        assert_eq!(
            expand_recurrence(&zero_interval, origin, date(2024, 1, 1), date(2024, 2, 1)),
            vec![origin]
        );

        let bad_frequency = RecurrenceRule {
            frequency: "daily".to_string(),
            ..RecurrenceRule::weekly(1, vec![3], None)
        };
        assert_eq!(
            expand_recurrence(&bad_frequency, origin, date(2024, 1, 1), date(2024, 2, 1)),
            vec![origin]
        );

        let bad_day = RecurrenceRule::weekly(1, vec![9], None);
        assert_eq!(
            expand_recurrence(&bad_day, origin, date(2024, 1, 1), date(2024, 2, 1)),
            vec![origin]
        );

        // Out of window: nothing at all.
        assert!(
            expand_recurrence(&zero_interval, origin, date(2024, 2, 1), date(2024, 3, 1))
                .is_empty()
        );
    }

    #[test]
    fn exceptions_suppress_dates() {
        let origin = date(2024, 1, 2);
        let mut rule = RecurrenceRule::weekly(1, vec![2], None);
        rule.exceptions = vec![date(2024, 1, 9)];

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 17));

        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 16)]);
    }

    #[test]
    fn window_clips_expansion() {
        let origin = date(2024, 1, 1);
        let rule = RecurrenceRule::weekly(1, vec![1], None);

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 9), date(2024, 1, 22));

        assert_eq!(dates, vec![date(2024, 1, 15), date(2024, 1, 22)]);
    }

    #[test]
    fn expand_item_marks_projected_copies_virtual() {
        let origin = date(2024, 1, 2);
        let origin_item = item(origin, Some(RecurrenceRule::weekly(1, vec![2], None)));

        let expanded = expand_item(&origin_item, date(2024, 1, 1), date(2024, 1, 17));

        assert_eq!(expanded.len(), 3);
        assert!(!expanded[0].is_virtual);
        assert_eq!(expanded[0].id, origin_item.id);
        for occurrence in &expanded[1..] {
            assert!(occurrence.is_virtual);
            assert_eq!(occurrence.origin_id, Some(origin_item.id));
            assert_eq!(occurrence.day, 2);
            assert_eq!(occurrence.week_start, week_start_of(occurrence.occurrence_date()));
        }
        assert_eq!(expanded[1].occurrence_date(), date(2024, 1, 9));
        assert_eq!(expanded[2].occurrence_date(), date(2024, 1, 16));
    }

    #[test]
    fn expand_item_non_recurring_respects_window() {
        let origin = date(2024, 1, 2);
        let one_off = item(origin, None);

        assert_eq!(expand_item(&one_off, date(2024, 1, 1), date(2024, 1, 7)).len(), 1);
        assert!(expand_item(&one_off, date(2024, 1, 3), date(2024, 1, 7)).is_empty());
    }

    #[test]
    fn week_alignment_is_sunday_based() {
        // Jan 3 2024 is a Wednesday; its week starts Sunday Dec 31 2023.
        assert_eq!(week_start_of(date(2024, 1, 3)), date(2023, 12, 31));
        assert_eq!(day_of_week(date(2023, 12, 31)), 0);
        assert_eq!(day_of_week(date(2024, 1, 6)), 6);
    }
}
