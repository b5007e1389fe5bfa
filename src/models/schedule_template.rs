use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A saved, reusable bundle of schedule items, decoupled from any specific
/// week. Applying one instantiates its items into a target week document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub items: Json<Vec<ScheduleTemplateItem>>,
    pub is_default: bool,
    pub usage_count: i32,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item of a template bundle. `day` is relative to the week it gets
/// applied into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTemplateItem {
    pub item_type: String,
    pub title: String,
    pub day: i16,
    pub start_time: String,
    pub end_time: Option<String>,
    pub workout_template_id: Option<Uuid>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default = "one")]
    pub repeat_interval: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScheduleTemplateRequest {
    pub name: String,
    pub items: Vec<ScheduleTemplateItem>,
    #[serde(default)]
    pub is_default: bool,
    pub metadata: Option<Value>,
}

/// Parameters for the heuristic weekly-plan generator. A single explicit
/// schema validated at the boundary, not a loose bag of optional fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTemplatesRequest {
    pub days_per_week: u8,
    #[serde(default)]
    pub preferred_days: Vec<u8>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub focus_tags: Vec<String>,
    #[serde(default = "one")]
    pub repeat_interval: u32,
    #[serde(default)]
    pub allow_back_to_back: bool,
    #[serde(default = "default_candidates")]
    pub candidate_count: u8,
}

fn default_candidates() -> u8 {
    3
}
