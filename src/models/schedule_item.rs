use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// How a single authored item repeats. Only weekly frequency is supported;
/// anything else is treated as malformed and degraded to a one-off at
/// expansion time rather than rejected at read time.
///
/// `exceptions` holds the suppressed occurrence dates produced by
/// scope="this" deletes. Keeping them on the rule means the origin item
/// stays the only persisted record of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(default = "weekly")]
    pub frequency: String,
    pub interval: u32,
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    #[serde(default)]
    pub exceptions: Vec<NaiveDate>,
}

fn weekly() -> String {
    "weekly".to_string()
}

impl RecurrenceRule {
    pub fn weekly(interval: u32, days_of_week: Vec<u8>, ends_on: Option<NaiveDate>) -> Self {
        Self {
            frequency: weekly(),
            interval,
            ends_on,
            days_of_week,
            exceptions: Vec::new(),
        }
    }

    /// Well-formed rules have weekly frequency, a positive interval and
    /// day values inside 0..=6.
    pub fn is_well_formed(&self) -> bool {
        self.frequency == "weekly" && self.interval >= 1 && self.days_of_week.iter().all(|d| *d <= 6)
    }
}

/// An ad-hoc calendar entry keyed to a week document. Recurring items are
/// the persisted origin of a series; `is_virtual`/`origin_id` are only set
/// on derived occurrences, which are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleItem {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Sunday-aligned start of the week document this item belongs to.
    pub week_start: NaiveDate,
    pub item_type: String,
    pub title: String,
    /// Day-of-week 0..=6 (0 = Sunday) within `week_start`.
    pub day: i16,
    pub start_time: String,
    pub end_time: Option<String>,
    pub is_recurring: bool,
    pub recurrence: Option<Json<RecurrenceRule>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(default)]
    pub is_virtual: bool,
    #[sqlx(default)]
    #[serde(default)]
    pub origin_id: Option<Uuid>,
}

impl ScheduleItem {
    /// Concrete date of this entry: week start plus the day offset.
    pub fn occurrence_date(&self) -> NaiveDate {
        self.week_start + Duration::days(self.day as i64)
    }

    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref().map(|r| &r.0)
    }

    /// Derived copy of this item placed on `date`, marked virtual and
    /// pointing back at the authoring item.
    pub fn virtual_occurrence(&self, date: NaiveDate, week_start: NaiveDate) -> ScheduleItem {
        let mut copy = self.clone();
        copy.week_start = week_start;
        copy.day = (date - week_start).num_days() as i16;
        copy.is_virtual = true;
        copy.origin_id = Some(self.id);
        copy
    }
}

/// Deletion granularity for recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    This,
    Future,
    All,
}

impl Default for DeleteScope {
    fn default() -> Self {
        DeleteScope::This
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleItemRequest {
    pub week_start: NaiveDate,
    pub item_type: String,
    pub title: String,
    pub day: i16,
    pub start_time: String,
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default = "default_interval")]
    pub repeat_interval: u32,
    pub repeat_ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub repeat_days_of_week: Vec<u8>,
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleItemRequest {
    pub title: Option<String>,
    pub item_type: Option<String>,
    pub day: Option<i16>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub repeat_ends_on: Option<NaiveDate>,
    pub repeat_days_of_week: Option<Vec<u8>>,
}

/// Weekly-keyed schedule document returned to the UI: the stored items for
/// the week plus virtual occurrences projected into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWeek {
    pub user_id: Uuid,
    pub week_start: NaiveDate,
    pub timezone: String,
    pub items: Vec<ScheduleItem>,
}
