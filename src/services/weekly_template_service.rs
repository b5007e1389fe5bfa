use std::collections::HashSet;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    is_valid_time, CreateWeeklyTemplateRequest, UpdateWeeklyTemplateRequest, WeeklyTemplate,
    WeeklyTemplateDay, WeeklyTemplateDayInput, WeeklyTemplateRow,
};
use crate::services::errors::{ScheduleError, ScheduleResult};

/// CRUD for weekly patterns. A template always carries exactly one slot
/// per day-of-week; create and update replace the full set atomically.
#[derive(Clone)]
pub struct WeeklyTemplateService {
    db: PgPool,
}

impl WeeklyTemplateService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateWeeklyTemplateRequest,
    ) -> ScheduleResult<WeeklyTemplate> {
        if request.name.trim().is_empty() {
            return Err(ScheduleError::validation("name is required"));
        }
        validate_days(&request.days)?;

        let mut tx = self.db.begin().await?;
        let now = Utc::now();
        let row = sqlx::query_as::<_, WeeklyTemplateRow>(
            r#"
            INSERT INTO weekly_templates (id, user_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let days = insert_days(&mut tx, row.id, &request.days).await?;
        tx.commit().await?;

        Ok(WeeklyTemplate::from_parts(row, days))
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<WeeklyTemplate> {
        let row = sqlx::query_as::<_, WeeklyTemplateRow>(
            "SELECT * FROM weekly_templates WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ScheduleError::not_found(format!("weekly template {id} not found")))?;

        let days = sqlx::query_as::<_, WeeklyTemplateDay>(
            "SELECT * FROM weekly_template_days WHERE weekly_template_id = $1 ORDER BY day_of_week",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(WeeklyTemplate::from_parts(row, days))
    }

    pub async fn list(&self, user_id: Uuid) -> ScheduleResult<Vec<WeeklyTemplate>> {
        let rows = sqlx::query_as::<_, WeeklyTemplateRow>(
            "SELECT * FROM weekly_templates WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let all_days = sqlx::query_as::<_, WeeklyTemplateDay>(
            "SELECT * FROM weekly_template_days WHERE weekly_template_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let templates = rows
            .into_iter()
            .map(|row| {
                let days: Vec<WeeklyTemplateDay> = all_days
                    .iter()
                    .filter(|d| d.weekly_template_id == row.id)
                    .cloned()
                    .collect();
                WeeklyTemplate::from_parts(row, days)
            })
            .collect();

        Ok(templates)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateWeeklyTemplateRequest,
    ) -> ScheduleResult<WeeklyTemplate> {
        let current = self.get(user_id, id).await?;

        let name = request.name.unwrap_or(current.name);
        let description = request.description.or(current.description);

        let mut tx = self.db.begin().await?;
        let row = sqlx::query_as::<_, WeeklyTemplateRow>(
            r#"
            UPDATE weekly_templates
            SET name = $3, description = $4, updated_at = $5
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&name)
        .bind(&description)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let days = if let Some(inputs) = request.days {
            validate_days(&inputs)?;
            sqlx::query("DELETE FROM weekly_template_days WHERE weekly_template_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_days(&mut tx, id, &inputs).await?
        } else {
            current.days
        };
        tx.commit().await?;

        Ok(WeeklyTemplate::from_parts(row, days))
    }

    /// Deletes the pattern. Active schedules built on it go with it (they
    /// are meaningless without the pattern); daily templates are untouched.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<()> {
        let result = sqlx::query("DELETE FROM weekly_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::not_found(format!(
                "weekly template {id} not found"
            )));
        }
        Ok(())
    }
}

async fn insert_days(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    template_id: Uuid,
    inputs: &[WeeklyTemplateDayInput],
) -> ScheduleResult<Vec<WeeklyTemplateDay>> {
    let mut days = Vec::with_capacity(7);
    for input in inputs {
        let day = sqlx::query_as::<_, WeeklyTemplateDay>(
            r#"
            INSERT INTO weekly_template_days (weekly_template_id, day_of_week, daily_template_id, override_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(template_id)
        .bind(input.day_of_week)
        .bind(input.daily_template_id)
        .bind(&input.override_time)
        .fetch_one(&mut **tx)
        .await?;
        days.push(day);
    }
    days.sort_by_key(|d| d.day_of_week);
    Ok(days)
}

/// Exactly one slot per day-of-week 0..=6.
fn validate_days(inputs: &[WeeklyTemplateDayInput]) -> ScheduleResult<()> {
    if inputs.len() != 7 {
        return Err(ScheduleError::validation(
            "a weekly template needs exactly 7 day slots",
        ));
    }
    let days: HashSet<i16> = inputs.iter().map(|d| d.day_of_week).collect();
    if days != (0..=6).collect::<HashSet<i16>>() {
        return Err(ScheduleError::validation(
            "day slots must cover each day of week 0-6 exactly once",
        ));
    }
    for input in inputs {
        if let Some(time) = &input.override_time {
            if !is_valid_time(time) {
                return Err(ScheduleError::validation("override_time must be HH:MM"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(day: i16) -> WeeklyTemplateDayInput {
        WeeklyTemplateDayInput {
            day_of_week: day,
            daily_template_id: None,
            override_time: None,
        }
    }

    #[test]
    fn full_week_passes() {
        let days: Vec<_> = (0..7).map(slot).collect();
        assert!(validate_days(&days).is_ok());
    }

    #[test]
    fn missing_or_duplicate_days_fail() {
        let six: Vec<_> = (0..6).map(slot).collect();
        assert!(validate_days(&six).is_err());

        let mut duplicated: Vec<_> = (0..6).map(slot).collect();
        duplicated.push(slot(5));
        assert!(validate_days(&duplicated).is_err());

        let mut out_of_range: Vec<_> = (0..6).map(slot).collect();
        out_of_range.push(slot(7));
        assert!(validate_days(&out_of_range).is_err());
    }

    #[test]
    fn bad_override_time_fails() {
        let mut days: Vec<_> = (0..7).map(slot).collect();
        days[2].override_time = Some("25:00".to_string());
        assert!(validate_days(&days).is_err());
    }
}
