use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A WeeklyTemplate bound to a concrete, possibly open-ended date range.
/// `end_date = None` repeats the pattern indefinitely; only `is_active`
/// gates calendar visibility.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActiveSchedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub weekly_template_id: Uuid,
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateScheduleRequest {
    pub weekly_template_id: Uuid,
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActiveScheduleRequest {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl ActiveSchedule {
    /// True when the schedule's date range intersects `[start, end]`.
    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date.map_or(true, |e| e >= start)
    }
}
