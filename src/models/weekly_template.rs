use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A weekly pattern: one slot per day-of-week, each pointing at a
/// DailyTemplate or left empty (rest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub days: Vec<WeeklyTemplateDay>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape without the joined day slots.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyTemplateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One day-of-week slot of a WeeklyTemplate. `daily_template_id = None`
/// marks the slot as a rest day; `override_time` replaces the daily
/// template's start time for this slot only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyTemplateDay {
    pub weekly_template_id: Uuid,
    pub day_of_week: i16,
    pub daily_template_id: Option<Uuid>,
    pub override_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTemplateDayInput {
    pub day_of_week: i16,
    pub daily_template_id: Option<Uuid>,
    pub override_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWeeklyTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    /// Exactly seven entries, one per day-of-week 0..=6.
    pub days: Vec<WeeklyTemplateDayInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWeeklyTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub days: Option<Vec<WeeklyTemplateDayInput>>,
}

impl WeeklyTemplate {
    pub fn from_parts(row: WeeklyTemplateRow, mut days: Vec<WeeklyTemplateDay>) -> Self {
        days.sort_by_key(|d| d.day_of_week);
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
