use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A reusable single-day activity definition: one workout, one cardio
/// session, or a rest day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub workout_template_id: Option<Uuid>,
    pub cardio_type: Option<String>,
    pub start_time: String,
    pub duration_minutes: i32,
    pub color: String,
    pub is_rest_day: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDailyTemplateRequest {
    pub name: String,
    pub workout_template_id: Option<Uuid>,
    pub cardio_type: Option<String>,
    pub start_time: String,
    pub duration_minutes: i32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_rest_day: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDailyTemplateRequest {
    pub name: Option<String>,
    pub workout_template_id: Option<Uuid>,
    pub cardio_type: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub color: Option<String>,
    pub is_rest_day: Option<bool>,
    pub notes: Option<String>,
}

fn default_color() -> String {
    "#4f46e5".to_string()
}
