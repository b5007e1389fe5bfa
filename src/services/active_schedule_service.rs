use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ActivateScheduleRequest, ActiveSchedule, UpdateActiveScheduleRequest};
use crate::services::errors::{ScheduleError, ScheduleResult};

/// Binds weekly patterns to concrete date ranges and toggles their
/// calendar visibility.
#[derive(Clone)]
pub struct ActiveScheduleService {
    db: PgPool,
}

impl ActiveScheduleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Activates a weekly template over `[start_date, end_date|∞]`.
    /// Rejects a missing template (not found) and an inverted date range
    /// (validation) before anything is persisted.
    pub async fn activate(
        &self,
        user_id: Uuid,
        request: ActivateScheduleRequest,
    ) -> ScheduleResult<ActiveSchedule> {
        validate_range(request.start_date, request.end_date)?;

        let template_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM weekly_templates WHERE id = $1 AND user_id = $2",
        )
        .bind(request.weekly_template_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        if template_exists == 0 {
            return Err(ScheduleError::not_found(format!(
                "weekly template {} not found",
                request.weekly_template_id
            )));
        }

        let schedule = sqlx::query_as::<_, ActiveSchedule>(
            r#"
            INSERT INTO active_schedules (
                id, user_id, weekly_template_id, name, start_date, end_date,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.weekly_template_id)
        .bind(&request.name)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(schedule)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<ActiveSchedule> {
        sqlx::query_as::<_, ActiveSchedule>(
            "SELECT * FROM active_schedules WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ScheduleError::not_found(format!("active schedule {id} not found")))
    }

    pub async fn list(&self, user_id: Uuid) -> ScheduleResult<Vec<ActiveSchedule>> {
        let schedules = sqlx::query_as::<_, ActiveSchedule>(
            "SELECT * FROM active_schedules WHERE user_id = $1 ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(schedules)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateActiveScheduleRequest,
    ) -> ScheduleResult<ActiveSchedule> {
        let current = self.get(user_id, id).await?;

        let name = request.name.or(current.name);
        let start_date = request.start_date.unwrap_or(current.start_date);
        let end_date = request.end_date.or(current.end_date);
        let is_active = request.is_active.unwrap_or(current.is_active);
        validate_range(start_date, end_date)?;

        let schedule = sqlx::query_as::<_, ActiveSchedule>(
            r#"
            UPDATE active_schedules
            SET name = $3, start_date = $4, end_date = $5, is_active = $6, updated_at = $7
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&name)
        .bind(start_date)
        .bind(end_date)
        .bind(is_active)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(schedule)
    }

    /// Flips calendar visibility without touching the date range.
    pub async fn toggle(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<ActiveSchedule> {
        sqlx::query_as::<_, ActiveSchedule>(
            r#"
            UPDATE active_schedules
            SET is_active = NOT is_active, updated_at = $3
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ScheduleError::not_found(format!("active schedule {id} not found")))
    }

    /// Removes the binding only; the referenced weekly template survives.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<()> {
        let result = sqlx::query("DELETE FROM active_schedules WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::not_found(format!(
                "active schedule {id} not found"
            )));
        }
        Ok(())
    }
}

fn validate_range(start_date: NaiveDate, end_date: Option<NaiveDate>) -> ScheduleResult<()> {
    if let Some(end) = end_date {
        if end < start_date {
            return Err(ScheduleError::validation(
                "end_date must be on or after start_date",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(validate_range(date(2024, 2, 1), Some(date(2024, 1, 1))).is_err());
        assert!(validate_range(date(2024, 1, 1), Some(date(2024, 1, 1))).is_ok());
        assert!(validate_range(date(2024, 1, 1), None).is_ok());
    }
}
