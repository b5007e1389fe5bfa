use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    is_valid_day, is_valid_time, CreateScheduleItemRequest, SaveScheduleTemplateRequest,
    ScheduleItem, ScheduleTemplate,
};
use crate::services::errors::{ScheduleError, ScheduleResult};
use crate::services::recurrence::week_start_of;
use crate::services::schedule_item_service::ScheduleItemService;

/// Saved schedule-item bundles: list/save/delete plus applying a bundle
/// into a concrete week document.
#[derive(Clone)]
pub struct ScheduleTemplateService {
    db: PgPool,
    items: ScheduleItemService,
}

impl ScheduleTemplateService {
    pub fn new(db: PgPool) -> Self {
        let items = ScheduleItemService::new(db.clone());
        Self { db, items }
    }

    pub async fn save(
        &self,
        user_id: Uuid,
        request: SaveScheduleTemplateRequest,
    ) -> ScheduleResult<ScheduleTemplate> {
        if request.name.trim().is_empty() {
            return Err(ScheduleError::validation("name is required"));
        }
        if request.items.is_empty() {
            return Err(ScheduleError::validation("a template needs at least one item"));
        }
        for item in &request.items {
            if !is_valid_day(item.day) {
                return Err(ScheduleError::validation("item day must be between 0 and 6"));
            }
            if !is_valid_time(&item.start_time) {
                return Err(ScheduleError::validation("item start_time must be HH:MM"));
            }
        }

        let template = sqlx::query_as::<_, ScheduleTemplate>(
            r#"
            INSERT INTO schedule_templates (
                id, user_id, name, items, is_default, usage_count, metadata,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.name)
        .bind(Json(request.items.clone()))
        .bind(request.is_default)
        .bind(&request.metadata)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(template)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<ScheduleTemplate> {
        sqlx::query_as::<_, ScheduleTemplate>(
            "SELECT * FROM schedule_templates WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ScheduleError::not_found(format!("schedule template {id} not found")))
    }

    pub async fn list(&self, user_id: Uuid) -> ScheduleResult<Vec<ScheduleTemplate>> {
        let templates = sqlx::query_as::<_, ScheduleTemplate>(
            "SELECT * FROM schedule_templates WHERE user_id = $1 ORDER BY is_default DESC, name",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(templates)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ScheduleResult<()> {
        let result = sqlx::query("DELETE FROM schedule_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::not_found(format!(
                "schedule template {id} not found"
            )));
        }
        Ok(())
    }

    /// Instantiates the bundle's items into the week containing
    /// `week_start` and bumps the template's usage count.
    pub async fn apply(
        &self,
        user_id: Uuid,
        id: Uuid,
        week_start: NaiveDate,
    ) -> ScheduleResult<Vec<ScheduleItem>> {
        let template = self.get(user_id, id).await?;
        let week_start = week_start_of(week_start);

        let mut created = Vec::with_capacity(template.items.0.len());
        for item in &template.items.0 {
            let request = CreateScheduleItemRequest {
                week_start,
                item_type: item.item_type.clone(),
                title: item.title.clone(),
                day: item.day,
                start_time: item.start_time.clone(),
                end_time: item.end_time.clone(),
                is_recurring: item.is_recurring,
                repeat_interval: item.repeat_interval,
                repeat_ends_on: None,
                repeat_days_of_week: vec![item.day as u8],
            };
            created.push(self.items.create_item(user_id, request).await?);
        }

        sqlx::query(
            "UPDATE schedule_templates SET usage_count = usage_count + 1, updated_at = $3 WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(created)
    }
}
