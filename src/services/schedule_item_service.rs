use chrono::{Duration, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    is_valid_day, is_valid_time, CreateScheduleItemRequest, DeleteScope, RecurrenceRule,
    ScheduleItem, ScheduleWeek, UpdateScheduleItemRequest,
};
use crate::services::errors::{ScheduleError, ScheduleResult};
use crate::services::recurrence::{expand_item, week_start_of};

/// CRUD and partial-series mutation over the weekly-keyed schedule item
/// store. Recurring origins are the only persisted rows of a series;
/// virtual occurrences are derived per read.
#[derive(Clone)]
pub struct ScheduleItemService {
    db: PgPool,
}

impl ScheduleItemService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_item(
        &self,
        user_id: Uuid,
        request: CreateScheduleItemRequest,
    ) -> ScheduleResult<ScheduleItem> {
        validate_item_request(&request)?;

        let week_start = week_start_of(request.week_start);
        let recurrence = if request.is_recurring {
            let days = normalize_days(&request.repeat_days_of_week);
            Some(Json(RecurrenceRule::weekly(
                request.repeat_interval,
                days,
                request.repeat_ends_on,
            )))
        } else {
            None
        };

        let item = sqlx::query_as::<_, ScheduleItem>(
            r#"
            INSERT INTO schedule_items (
                id, user_id, week_start, item_type, title, day,
                start_time, end_time, is_recurring, recurrence, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(week_start)
        .bind(&request.item_type)
        .bind(&request.title)
        .bind(request.day)
        .bind(&request.start_time)
        .bind(&request.end_time)
        .bind(request.is_recurring)
        .bind(recurrence)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    pub async fn get_item(&self, user_id: Uuid, item_id: Uuid) -> ScheduleResult<ScheduleItem> {
        sqlx::query_as::<_, ScheduleItem>(
            "SELECT * FROM schedule_items WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ScheduleError::not_found(format!("schedule item {item_id} not found")))
    }

    /// Updates the origin item, i.e. the whole series for recurring items.
    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        request: UpdateScheduleItemRequest,
    ) -> ScheduleResult<ScheduleItem> {
        let mut item = self.get_item(user_id, item_id).await?;

        if let Some(title) = request.title {
            item.title = title;
        }
        if let Some(item_type) = request.item_type {
            item.item_type = item_type;
        }
        if let Some(day) = request.day {
            if !is_valid_day(day) {
                return Err(ScheduleError::validation("day must be between 0 and 6"));
            }
            item.day = day;
        }
        if let Some(start_time) = request.start_time {
            if !is_valid_time(&start_time) {
                return Err(ScheduleError::validation("start_time must be HH:MM"));
            }
            item.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            if !is_valid_time(&end_time) {
                return Err(ScheduleError::validation("end_time must be HH:MM"));
            }
            item.end_time = Some(end_time);
        }
        if let Some(Json(rule)) = item.recurrence.as_mut() {
            if let Some(ends_on) = request.repeat_ends_on {
                rule.ends_on = Some(ends_on);
            }
            if let Some(days) = request.repeat_days_of_week {
                if days.iter().any(|d| *d > 6) {
                    return Err(ScheduleError::validation(
                        "repeat_days_of_week values must be between 0 and 6",
                    ));
                }
                rule.days_of_week = normalize_days(&days);
            }
        }

        let updated = sqlx::query_as::<_, ScheduleItem>(
            r#"
            UPDATE schedule_items
            SET item_type = $3, title = $4, day = $5, start_time = $6,
                end_time = $7, recurrence = $8, updated_at = $9
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(&item.item_type)
        .bind(&item.title)
        .bind(item.day)
        .bind(&item.start_time)
        .bind(&item.end_time)
        .bind(&item.recurrence)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(updated)
    }

    /// Applies a delete with occurrence-level granularity.
    ///
    /// Re-issuing the same delete is a no-op: a missing item means the
    /// series is already gone, an already-recorded exception or an already
    /// tight `ends_on` leave the row untouched.
    pub async fn delete_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        scope: DeleteScope,
        occurrence_date: Option<NaiveDate>,
    ) -> ScheduleResult<()> {
        let Some(item) = sqlx::query_as::<_, ScheduleItem>(
            "SELECT * FROM schedule_items WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        else {
            info!(%item_id, "delete on absent schedule item, nothing to do");
            return Ok(());
        };

        // A non-recurring item has a single occurrence: every scope
        // degenerates to removing the row.
        if !item.is_recurring || item.recurrence.is_none() {
            return self.delete_row(user_id, item_id).await;
        }

        match scope {
            DeleteScope::All => self.delete_row(user_id, item_id).await,
            DeleteScope::This => {
                let date = occurrence_date.unwrap_or_else(|| item.occurrence_date());
                let mut rule = item.rule().cloned().unwrap_or_else(|| {
                    RecurrenceRule::weekly(1, vec![], None)
                });
                if add_exception(&mut rule, date) {
                    self.store_rule(user_id, item_id, &rule).await?;
                }
                Ok(())
            }
            DeleteScope::Future => {
                let date = occurrence_date.ok_or_else(|| {
                    ScheduleError::validation(
                        "occurrence_date is required for scope=future on a recurring item",
                    )
                })?;
                let cutoff = future_cutoff(date).ok_or_else(|| {
                    ScheduleError::validation("occurrence_date is out of range")
                })?;
                let mut rule = item.rule().cloned().unwrap_or_else(|| {
                    RecurrenceRule::weekly(1, vec![], None)
                });
                if tighten_ends_on(&mut rule, cutoff) {
                    self.store_rule(user_id, item_id, &rule).await?;
                }
                Ok(())
            }
        }
    }

    /// Weekly-keyed document read: stored items of the week plus virtual
    /// occurrences of recurring series authored in earlier weeks.
    pub async fn get_week(
        &self,
        user_id: Uuid,
        week_start: NaiveDate,
    ) -> ScheduleResult<ScheduleWeek> {
        let week_start = week_start_of(week_start);
        let week_end = week_start + Duration::days(6);
        let items = self.items_in_range(user_id, week_start, week_end).await?;

        Ok(ScheduleWeek {
            user_id,
            week_start,
            timezone: "UTC".to_string(),
            items,
        })
    }

    /// All concrete occurrences (stored and virtual) inside the window,
    /// ordered by date then start time.
    pub async fn items_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ScheduleResult<Vec<ScheduleItem>> {
        // Recurring origins from any week up to the window end can project
        // into it; one-off items only live in the window's own weeks.
        let origins = sqlx::query_as::<_, ScheduleItem>(
            r#"
            SELECT * FROM schedule_items
            WHERE user_id = $1
              AND (
                    (is_recurring AND week_start <= $3)
                 OR (NOT is_recurring AND week_start >= $2 AND week_start <= $3)
              )
            ORDER BY week_start, day, start_time
            "#,
        )
        .bind(user_id)
        .bind(week_start_of(start))
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let mut occurrences: Vec<ScheduleItem> = origins
            .iter()
            .flat_map(|item| expand_item(item, start, end))
            .collect();
        occurrences.sort_by(|a, b| {
            a.occurrence_date()
                .cmp(&b.occurrence_date())
                .then_with(|| a.start_time.cmp(&b.start_time))
        });

        Ok(occurrences)
    }

    async fn delete_row(&self, user_id: Uuid, item_id: Uuid) -> ScheduleResult<()> {
        sqlx::query("DELETE FROM schedule_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn store_rule(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        rule: &RecurrenceRule,
    ) -> ScheduleResult<()> {
        sqlx::query(
            "UPDATE schedule_items SET recurrence = $3, updated_at = $4 WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(Json(rule.clone()))
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

fn validate_item_request(request: &CreateScheduleItemRequest) -> ScheduleResult<()> {
    if request.title.trim().is_empty() {
        return Err(ScheduleError::validation("title is required"));
    }
    if !is_valid_day(request.day) {
        return Err(ScheduleError::validation("day must be between 0 and 6"));
    }
    if !is_valid_time(&request.start_time) {
        return Err(ScheduleError::validation("start_time must be HH:MM"));
    }
    if let Some(end_time) = &request.end_time {
        if !is_valid_time(end_time) {
            return Err(ScheduleError::validation("end_time must be HH:MM"));
        }
    }
    if request.is_recurring {
        if request.repeat_interval < 1 {
            return Err(ScheduleError::validation(
                "repeat_interval must be at least 1 for recurring items",
            ));
        }
        if request.repeat_days_of_week.iter().any(|d| *d > 6) {
            return Err(ScheduleError::validation(
                "repeat_days_of_week values must be between 0 and 6",
            ));
        }
    }
    Ok(())
}

fn normalize_days(days: &[u8]) -> Vec<u8> {
    let mut days: Vec<u8> = days.to_vec();
    days.sort_unstable();
    days.dedup();
    days
}

/// The day immediately preceding the targeted occurrence; everything after
/// it is cut off the series.
fn future_cutoff(occurrence: NaiveDate) -> Option<NaiveDate> {
    occurrence.pred_opt()
}

/// Records a suppressed date; returns false when already present so the
/// caller can skip the write.
fn add_exception(rule: &mut RecurrenceRule, date: NaiveDate) -> bool {
    if rule.exceptions.contains(&date) {
        return false;
    }
    rule.exceptions.push(date);
    rule.exceptions.sort_unstable();
    true
}

/// Moves `ends_on` back to `cutoff` if that actually shortens the series;
/// returns false otherwise.
fn tighten_ends_on(rule: &mut RecurrenceRule, cutoff: NaiveDate) -> bool {
    match rule.ends_on {
        Some(current) if current <= cutoff => false,
        _ => {
            rule.ends_on = Some(cutoff);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recurrence::expand_recurrence;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn future_cutoff_is_previous_day() {
        assert_eq!(future_cutoff(date(2024, 1, 16)), Some(date(2024, 1, 15)));
        assert_eq!(future_cutoff(date(2024, 3, 1)), Some(date(2024, 2, 29)));
    }

    #[test]
    fn add_exception_is_idempotent() {
        let mut rule = RecurrenceRule::weekly(1, vec![2], None);
        assert!(add_exception(&mut rule, date(2024, 1, 9)));
        assert!(!add_exception(&mut rule, date(2024, 1, 9)));
        assert_eq!(rule.exceptions, vec![date(2024, 1, 9)]);
    }

    #[test]
    fn tighten_ends_on_only_shortens() {
        let mut rule = RecurrenceRule::weekly(1, vec![2], Some(date(2024, 2, 1)));

        assert!(tighten_ends_on(&mut rule, date(2024, 1, 15)));
        assert_eq!(rule.ends_on, Some(date(2024, 1, 15)));

        // Re-issuing the same cutoff, or a later one, changes nothing.
        assert!(!tighten_ends_on(&mut rule, date(2024, 1, 15)));
        assert!(!tighten_ends_on(&mut rule, date(2024, 2, 1)));
        assert_eq!(rule.ends_on, Some(date(2024, 1, 15)));

        let mut open_ended = RecurrenceRule::weekly(1, vec![2], None);
        assert!(tighten_ends_on(&mut open_ended, date(2024, 1, 15)));
        assert_eq!(open_ended.ends_on, Some(date(2024, 1, 15)));
    }

    #[test]
    fn future_delete_cuts_series_at_target() {
        // Tuesdays starting Jan 2; delete scope=future targeting Jan 16
        // leaves only Jan 2 and Jan 9 even when querying through March.
        let origin = date(2024, 1, 2);
        let mut rule = RecurrenceRule::weekly(1, vec![2], Some(date(2024, 2, 1)));

        let cutoff = future_cutoff(date(2024, 1, 16)).unwrap();
        assert!(tighten_ends_on(&mut rule, cutoff));

        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 3, 31));
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 9)]);
    }

    #[test]
    fn this_delete_suppresses_single_occurrence() {
        let origin = date(2024, 1, 2);
        let mut rule = RecurrenceRule::weekly(1, vec![2], None);

        add_exception(&mut rule, date(2024, 1, 9));
        let first = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 23));

        // Same delete again: suppressed set unchanged.
        add_exception(&mut rule, date(2024, 1, 9));
        let second = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 23));

        assert_eq!(first, second);
        assert_eq!(first, vec![date(2024, 1, 2), date(2024, 1, 16), date(2024, 1, 23)]);
    }

    #[test]
    fn suppressing_origin_date_keeps_series_alive() {
        let origin = date(2024, 1, 2);
        let mut rule = RecurrenceRule::weekly(1, vec![2], None);

        add_exception(&mut rule, origin);
        let dates = expand_recurrence(&rule, origin, date(2024, 1, 1), date(2024, 1, 17));

        assert_eq!(dates, vec![date(2024, 1, 9), date(2024, 1, 16)]);
    }

    #[test]
    fn create_request_validation() {
        let base = CreateScheduleItemRequest {
            week_start: date(2024, 1, 1),
            item_type: "workout".to_string(),
            title: "Tempo Run".to_string(),
            day: 2,
            start_time: "06:30".to_string(),
            end_time: None,
            is_recurring: true,
            repeat_interval: 1,
            repeat_ends_on: None,
            repeat_days_of_week: vec![2, 4],
        };
        assert!(validate_item_request(&base).is_ok());

        let mut bad_day = base.clone();
        bad_day.day = 7;
        assert!(matches!(
            validate_item_request(&bad_day),
            Err(ScheduleError::Validation(_))
        ));

        let mut bad_time = base.clone();
        bad_time.start_time = "6:30".to_string();
        assert!(validate_item_request(&bad_time).is_err());

        let mut bad_interval = base.clone();
        bad_interval.repeat_interval = 0;
        assert!(validate_item_request(&bad_interval).is_err());

        let mut bad_repeat_day = base;
        bad_repeat_day.repeat_days_of_week = vec![8];
        assert!(validate_item_request(&bad_repeat_day).is_err());
    }
}
