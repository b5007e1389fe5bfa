use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    is_valid_time, CreateDailyTemplateRequest, DailyTemplate, UpdateDailyTemplateRequest,
};
use crate::services::errors::{ScheduleError, ScheduleResult};

/// CRUD for single-day activity definitions. The workout-xor-cardio
/// invariant is enforced here, not left to the UI.
#[derive(Clone)]
pub struct DailyTemplateService {
    db: PgPool,
}

impl DailyTemplateService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateDailyTemplateRequest,
    ) -> ScheduleResult<DailyTemplate> {
        validate_activity(
            request.is_rest_day,
            request.workout_template_id.is_some(),
            request.cardio_type.is_some(),
        )?;
        if request.name.trim().is_empty() {
            return Err(ScheduleError::validation("name is required"));
        }
        if !is_valid_time(&request.start_time) {
            return Err(ScheduleError::validation("start_time must be HH:MM"));
        }
        if request.duration_minutes <= 0 {
            return Err(ScheduleError::validation("duration_minutes must be positive"));
        }

        let template = sqlx::query_as::<_, DailyTemplate>(
            r#"
            INSERT INTO daily_templates (
                id, user_id, name, workout_template_id, cardio_type,
                start_time, duration_minutes, color, is_rest_day, notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.name)
        .bind(request.workout_template_id)
        .bind(&request.cardio_type)
        .bind(&request.start_time)
        .bind(request.duration_minutes)
        .bind(&request.color)
        .bind(request.is_rest_day)
        .bind(&request.notes)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(template)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<DailyTemplate> {
        sqlx::query_as::<_, DailyTemplate>(
            "SELECT * FROM daily_templates WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ScheduleError::not_found(format!("daily template {id} not found")))
    }

    pub async fn list(&self, user_id: Uuid) -> ScheduleResult<Vec<DailyTemplate>> {
        let templates = sqlx::query_as::<_, DailyTemplate>(
            "SELECT * FROM daily_templates WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(templates)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateDailyTemplateRequest,
    ) -> ScheduleResult<DailyTemplate> {
        let mut template = self.get(user_id, id).await?;

        if let Some(name) = request.name {
            template.name = name;
        }
        if let Some(is_rest_day) = request.is_rest_day {
            template.is_rest_day = is_rest_day;
            if is_rest_day {
                template.workout_template_id = None;
                template.cardio_type = None;
            }
        }
        if request.workout_template_id.is_some() && request.cardio_type.is_some() {
            return Err(ScheduleError::validation(
                "set either workout_template_id or cardio_type, not both",
            ));
        }
        if request.workout_template_id.is_some() {
            template.workout_template_id = request.workout_template_id;
            template.cardio_type = None;
        }
        if request.cardio_type.is_some() {
            template.cardio_type = request.cardio_type;
            template.workout_template_id = None;
        }
        if let Some(start_time) = request.start_time {
            if !is_valid_time(&start_time) {
                return Err(ScheduleError::validation("start_time must be HH:MM"));
            }
            template.start_time = start_time;
        }
        if let Some(duration) = request.duration_minutes {
            if duration <= 0 {
                return Err(ScheduleError::validation("duration_minutes must be positive"));
            }
            template.duration_minutes = duration;
        }
        if let Some(color) = request.color {
            template.color = color;
        }
        if request.notes.is_some() {
            template.notes = request.notes;
        }

        validate_activity(
            template.is_rest_day,
            template.workout_template_id.is_some(),
            template.cardio_type.is_some(),
        )?;

        let updated = sqlx::query_as::<_, DailyTemplate>(
            r#"
            UPDATE daily_templates
            SET name = $3, workout_template_id = $4, cardio_type = $5,
                start_time = $6, duration_minutes = $7, color = $8,
                is_rest_day = $9, notes = $10, updated_at = $11
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&template.name)
        .bind(template.workout_template_id)
        .bind(&template.cardio_type)
        .bind(&template.start_time)
        .bind(template.duration_minutes)
        .bind(&template.color)
        .bind(template.is_rest_day)
        .bind(&template.notes)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(updated)
    }

    /// Deletes the template. Weekly slots referencing it are cleared to
    /// rest via the FK's ON DELETE SET NULL.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<()> {
        let result = sqlx::query("DELETE FROM daily_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::not_found(format!(
                "daily template {id} not found"
            )));
        }
        Ok(())
    }
}

/// Non-rest days carry exactly one activity source; rest days carry none.
fn validate_activity(is_rest_day: bool, has_workout: bool, has_cardio: bool) -> ScheduleResult<()> {
    match (is_rest_day, has_workout, has_cardio) {
        (true, false, false) => Ok(()),
        (true, _, _) => Err(ScheduleError::validation(
            "a rest day cannot reference a workout or cardio type",
        )),
        (false, true, false) | (false, false, true) => Ok(()),
        (false, true, true) => Err(ScheduleError::validation(
            "set either workout_template_id or cardio_type, not both",
        )),
        (false, false, false) => Err(ScheduleError::validation(
            "a non-rest day needs a workout_template_id or a cardio_type",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_invariant() {
        assert!(validate_activity(true, false, false).is_ok());
        assert!(validate_activity(false, true, false).is_ok());
        assert!(validate_activity(false, false, true).is_ok());

        assert!(validate_activity(true, true, false).is_err());
        assert!(validate_activity(true, false, true).is_err());
        assert!(validate_activity(false, true, true).is_err());
        assert!(validate_activity(false, false, false).is_err());
    }
}
