use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ScheduleItem;

/// One concrete calendar entry derived from an ActiveSchedule. Never
/// persisted; recomputed on every calendar read. Rest days surface as
/// entries with `is_rest_day = true` and no workout payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarWorkout {
    pub date: NaiveDate,
    pub active_schedule_id: Uuid,
    pub daily_template_id: Option<Uuid>,
    pub name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub cardio_type: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub color: Option<String>,
    pub is_rest_day: bool,
    pub is_completed: bool,
}

impl CalendarWorkout {
    pub fn rest_day(date: NaiveDate, active_schedule_id: Uuid) -> Self {
        Self {
            date,
            active_schedule_id,
            daily_template_id: None,
            name: "Rest Day".to_string(),
            category: None,
            difficulty: None,
            cardio_type: None,
            start_time: None,
            duration_minutes: None,
            color: None,
            is_rest_day: true,
            is_completed: false,
        }
    }
}

/// Union of materialized template workouts and ad-hoc item occurrences for
/// a queried window.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub workouts: Vec<CalendarWorkout>,
    pub items: Vec<ScheduleItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub user_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
}
