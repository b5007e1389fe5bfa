use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Read model for the workout-template collaborator store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_duration: Option<i32>,
    pub exercises: Option<Value>,
}

/// Read model for the workout-session collaborator store, used only for
/// completion enrichment of materialized calendar entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub status: String,
    pub start_time: Option<String>,
}

impl WorkoutSession {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}
