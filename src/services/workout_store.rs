//! Read-only access to the workout-template and workout-session
//! collaborator stores. The schedule core never mutates either.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{WorkoutSession, WorkoutTemplate};
use crate::services::errors::ScheduleResult;

#[derive(Clone)]
pub struct WorkoutStore {
    db: PgPool,
}

impl WorkoutStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_templates(&self, user_id: Uuid) -> ScheduleResult<Vec<WorkoutTemplate>> {
        let templates = sqlx::query_as::<_, WorkoutTemplate>(
            "SELECT * FROM workout_templates WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(templates)
    }

    pub async fn templates_by_ids(&self, ids: &[Uuid]) -> ScheduleResult<Vec<WorkoutTemplate>> {
        let templates = sqlx::query_as::<_, WorkoutTemplate>(
            "SELECT * FROM workout_templates WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;
        Ok(templates)
    }

    pub async fn sessions_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ScheduleResult<Vec<WorkoutSession>> {
        let sessions = sqlx::query_as::<_, WorkoutSession>(
            "SELECT * FROM workout_sessions WHERE user_id = $1 AND date >= $2 AND date <= $3 ORDER BY date",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;
        Ok(sessions)
    }
}
