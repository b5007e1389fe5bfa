use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    ActiveSchedule, CalendarResponse, CalendarWorkout, DailyTemplate, WeeklyTemplateDay,
    WorkoutSession, WorkoutTemplate,
};
use crate::services::errors::{ScheduleError, ScheduleResult};
use crate::services::recurrence::day_of_week;
use crate::services::schedule_item_service::ScheduleItemService;
use crate::services::workout_store::WorkoutStore;

/// Read-only materialization of active schedules onto the calendar,
/// merged with ad-hoc schedule item occurrences. Recomputed on every
/// request; nothing derived is ever written back.
#[derive(Clone)]
pub struct CalendarService {
    db: PgPool,
    items: ScheduleItemService,
    workouts: WorkoutStore,
}

impl CalendarService {
    pub fn new(db: PgPool) -> Self {
        let items = ScheduleItemService::new(db.clone());
        let workouts = WorkoutStore::new(db.clone());
        Self { db, items, workouts }
    }

    /// Expands every active schedule intersecting `[start, end]` into
    /// per-date entries. Overlapping schedules all emit; the UI decides
    /// how to display multiple entries per day.
    pub async fn materialize_calendar(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ScheduleResult<Vec<CalendarWorkout>> {
        if end < start {
            return Err(ScheduleError::validation("end must not precede start"));
        }

        let schedules = sqlx::query_as::<_, ActiveSchedule>(
            r#"
            SELECT * FROM active_schedules
            WHERE user_id = $1 AND is_active
              AND start_date <= $3
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY start_date
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        if schedules.is_empty() {
            return Ok(Vec::new());
        }

        let template_ids: Vec<Uuid> = schedules.iter().map(|s| s.weekly_template_id).collect();
        let slots = sqlx::query_as::<_, WeeklyTemplateDay>(
            "SELECT * FROM weekly_template_days WHERE weekly_template_id = ANY($1)",
        )
        .bind(&template_ids)
        .fetch_all(&self.db)
        .await?;

        let daily_ids: Vec<Uuid> = slots.iter().filter_map(|s| s.daily_template_id).collect();
        let dailies = sqlx::query_as::<_, DailyTemplate>(
            "SELECT * FROM daily_templates WHERE id = ANY($1)",
        )
        .bind(&daily_ids)
        .fetch_all(&self.db)
        .await?;

        let workout_ids: Vec<Uuid> = dailies.iter().filter_map(|d| d.workout_template_id).collect();
        let workouts = self.workouts.templates_by_ids(&workout_ids).await?;
        let sessions = self.workouts.sessions_in_range(user_id, start, end).await?;

        let slot_map = index_slots(&slots);
        let daily_map: HashMap<Uuid, &DailyTemplate> =
            dailies.iter().map(|d| (d.id, d)).collect();
        let workout_map: HashMap<Uuid, &WorkoutTemplate> =
            workouts.iter().map(|w| (w.id, w)).collect();

        let mut entries = Vec::new();
        for schedule in &schedules {
            entries.extend(expand_schedule(
                schedule,
                &slot_map,
                &daily_map,
                &workout_map,
                start,
                end,
            ));
        }
        entries.sort_by(|a, b| a.date.cmp(&b.date));

        mark_completion(&mut entries, &sessions);

        Ok(entries)
    }

    /// The full calendar payload: materialized workouts plus expanded
    /// ad-hoc schedule items for the same window.
    pub async fn calendar(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ScheduleResult<CalendarResponse> {
        let workouts = self.materialize_calendar(user_id, start, end).await?;
        let items = self.items.items_in_range(user_id, start, end).await?;

        Ok(CalendarResponse {
            start,
            end,
            workouts,
            items,
        })
    }
}

type SlotMap<'a> = HashMap<(Uuid, i16), &'a WeeklyTemplateDay>;

fn index_slots(slots: &[WeeklyTemplateDay]) -> SlotMap<'_> {
    slots
        .iter()
        .map(|s| ((s.weekly_template_id, s.day_of_week), s))
        .collect()
}

/// Walks each date of the schedule's range intersected with the window
/// and resolves the weekly slot for that weekday. Missing slots, empty
/// slots and rest-day templates all become rest markers.
fn expand_schedule(
    schedule: &ActiveSchedule,
    slots: &SlotMap<'_>,
    dailies: &HashMap<Uuid, &DailyTemplate>,
    workouts: &HashMap<Uuid, &WorkoutTemplate>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<CalendarWorkout> {
    if !schedule.intersects(window_start, window_end) {
        return Vec::new();
    }

    let from = schedule.start_date.max(window_start);
    let to = schedule
        .end_date
        .map_or(window_end, |e| e.min(window_end));

    let mut entries = Vec::new();
    let mut date = from;
    while date <= to {
        entries.push(resolve_date(schedule, slots, dailies, workouts, date));
        date += Duration::days(1);
    }
    entries
}

fn resolve_date(
    schedule: &ActiveSchedule,
    slots: &SlotMap<'_>,
    dailies: &HashMap<Uuid, &DailyTemplate>,
    workouts: &HashMap<Uuid, &WorkoutTemplate>,
    date: NaiveDate,
) -> CalendarWorkout {
    let slot = slots.get(&(schedule.weekly_template_id, day_of_week(date)));
    let daily = slot
        .and_then(|s| s.daily_template_id)
        .and_then(|id| dailies.get(&id).copied());

    let Some(daily) = daily else {
        return CalendarWorkout::rest_day(date, schedule.id);
    };
    if daily.is_rest_day {
        return CalendarWorkout::rest_day(date, schedule.id);
    }

    let workout = daily
        .workout_template_id
        .and_then(|id| workouts.get(&id).copied());
    let start_time = slot
        .and_then(|s| s.override_time.clone())
        .unwrap_or_else(|| daily.start_time.clone());

    CalendarWorkout {
        date,
        active_schedule_id: schedule.id,
        daily_template_id: Some(daily.id),
        name: workout.map_or_else(|| daily.name.clone(), |w| w.name.clone()),
        category: workout.and_then(|w| w.category.clone()),
        difficulty: workout.and_then(|w| w.difficulty.clone()),
        cardio_type: daily.cardio_type.clone(),
        start_time: Some(start_time),
        duration_minutes: Some(daily.duration_minutes),
        color: Some(daily.color.clone()),
        is_rest_day: false,
        is_completed: false,
    }
}

/// Flags entries with a completed session on the same date whose name
/// fuzzily matches (case-insensitive containment either way).
fn mark_completion(entries: &mut [CalendarWorkout], sessions: &[WorkoutSession]) {
    for entry in entries.iter_mut() {
        if entry.is_rest_day {
            continue;
        }
        entry.is_completed = sessions.iter().any(|session| {
            session.date == entry.date
                && session.is_completed()
                && titles_match(&entry.name, &session.name)
        });
    }
}

fn titles_match(workout: &str, session: &str) -> bool {
    let workout = workout.trim().to_lowercase();
    let session = session.trim().to_lowercase();
    // Containment is vacuously true for an empty string; an unnamed
    // session must not complete every workout on its date.
    if workout.is_empty() || session.is_empty() {
        return false;
    }
    workout.contains(&session) || session.contains(&workout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(
        template_id: Uuid,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> ActiveSchedule {
        ActiveSchedule {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            weekly_template_id: template_id,
            name: None,
            start_date: start,
            end_date: end,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn daily(name: &str, workout_id: Option<Uuid>) -> DailyTemplate {
        DailyTemplate {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            workout_template_id: workout_id,
            cardio_type: None,
            start_time: "07:00".to_string(),
            duration_minutes: 60,
            color: "#22c55e".to_string(),
            is_rest_day: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn slot(template_id: Uuid, day: i16, daily_id: Option<Uuid>) -> WeeklyTemplateDay {
        WeeklyTemplateDay {
            weekly_template_id: template_id,
            day_of_week: day,
            daily_template_id: daily_id,
            override_time: None,
        }
    }

    fn full_week_slots(template_id: Uuid, assigned: &[(i16, Uuid)]) -> Vec<WeeklyTemplateDay> {
        (0..7)
            .map(|day| {
                let daily_id = assigned.iter().find(|(d, _)| *d == day).map(|(_, id)| *id);
                slot(template_id, day, daily_id)
            })
            .collect()
    }

    #[test]
    fn monday_only_template_over_three_weeks() {
        // Monday "Push Day", all other days rest; schedule open-ended from
        // Mon Jan 1 2024. Jan 1..Jan 21 holds exactly three workout dates.
        let template_id = Uuid::new_v4();
        let push_day = daily("Push Day", None);
        let slots_vec = full_week_slots(template_id, &[(1, push_day.id)]);
        let schedule = schedule(template_id, date(2024, 1, 1), None);

        let slot_map = index_slots(&slots_vec);
        let daily_map: HashMap<Uuid, &DailyTemplate> =
            std::iter::once((push_day.id, &push_day)).collect();
        let workout_map = HashMap::new();

        let entries = expand_schedule(
            &schedule,
            &slot_map,
            &daily_map,
            &workout_map,
            date(2024, 1, 1),
            date(2024, 1, 21),
        );

        assert_eq!(entries.len(), 21);
        let workouts: Vec<&CalendarWorkout> =
            entries.iter().filter(|e| !e.is_rest_day).collect();
        assert_eq!(workouts.len(), 3);
        assert_eq!(workouts[0].date, date(2024, 1, 1));
        assert_eq!(workouts[1].date, date(2024, 1, 8));
        assert_eq!(workouts[2].date, date(2024, 1, 15));
        for w in &workouts {
            assert_eq!(w.name, "Push Day");
            assert_eq!(w.start_time.as_deref(), Some("07:00"));
            assert_eq!(w.duration_minutes, Some(60));
        }
    }

    #[test]
    fn overlapping_schedules_all_emit() {
        // Two active schedules cover the same Monday: one with a workout,
        // one resting. Both entries must surface, no collapsing.
        let lift_template = Uuid::new_v4();
        let rest_template = Uuid::new_v4();
        let lift = daily("Heavy Squats", None);

        let mut slots_vec = full_week_slots(lift_template, &[(1, lift.id)]);
        slots_vec.extend(full_week_slots(rest_template, &[]));

        let a = schedule(lift_template, date(2024, 1, 1), None);
        let b = schedule(rest_template, date(2024, 1, 1), None);

        let slot_map = index_slots(&slots_vec);
        let daily_map: HashMap<Uuid, &DailyTemplate> =
            std::iter::once((lift.id, &lift)).collect();
        let workout_map = HashMap::new();

        let day = date(2024, 1, 1);
        let mut entries = expand_schedule(&a, &slot_map, &daily_map, &workout_map, day, day);
        entries.extend(expand_schedule(&b, &slot_map, &daily_map, &workout_map, day, day));

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| !e.is_rest_day && e.name == "Heavy Squats"));
        assert!(entries.iter().any(|e| e.is_rest_day));
        assert_ne!(entries[0].active_schedule_id, entries[1].active_schedule_id);
    }

    #[test]
    fn schedule_range_clips_expansion() {
        let template_id = Uuid::new_v4();
        let ride = daily("Easy Ride", None);
        let slots_vec = full_week_slots(template_id, &[(3, ride.id)]);
        // Bounded schedule: only Jan 10 falls inside it.
        let schedule = schedule(template_id, date(2024, 1, 8), Some(date(2024, 1, 12)));

        let slot_map = index_slots(&slots_vec);
        let daily_map: HashMap<Uuid, &DailyTemplate> =
            std::iter::once((ride.id, &ride)).collect();

        let entries = expand_schedule(
            &schedule,
            &slot_map,
            &daily_map,
            &HashMap::new(),
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        assert_eq!(entries.len(), 5); // Jan 8..=12 only
        let workouts: Vec<&CalendarWorkout> =
            entries.iter().filter(|e| !e.is_rest_day).collect();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].date, date(2024, 1, 10));
    }

    #[test]
    fn override_time_wins_over_daily_start() {
        let template_id = Uuid::new_v4();
        let run = daily("Morning Run", None);
        let mut slots_vec = full_week_slots(template_id, &[(2, run.id)]);
        slots_vec
            .iter_mut()
            .find(|s| s.day_of_week == 2)
            .unwrap()
            .override_time = Some("18:30".to_string());
        let schedule = schedule(template_id, date(2024, 1, 2), Some(date(2024, 1, 2)));

        let slot_map = index_slots(&slots_vec);
        let daily_map: HashMap<Uuid, &DailyTemplate> =
            std::iter::once((run.id, &run)).collect();

        let entries = expand_schedule(
            &schedule,
            &slot_map,
            &daily_map,
            &HashMap::new(),
            date(2024, 1, 1),
            date(2024, 1, 7),
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start_time.as_deref(), Some("18:30"));
    }

    #[test]
    fn completion_matches_by_date_and_fuzzy_title() {
        let schedule_id = Uuid::new_v4();
        let mut entries = vec![
            CalendarWorkout {
                date: date(2024, 1, 1),
                active_schedule_id: schedule_id,
                daily_template_id: None,
                name: "Push Day".to_string(),
                category: None,
                difficulty: None,
                cardio_type: None,
                start_time: Some("07:00".to_string()),
                duration_minutes: Some(60),
                color: None,
                is_rest_day: false,
                is_completed: false,
            },
            CalendarWorkout::rest_day(date(2024, 1, 2), schedule_id),
        ];
        let user_id = Uuid::new_v4();
        let sessions = vec![
            WorkoutSession {
                id: Uuid::new_v4(),
                user_id,
                date: date(2024, 1, 1),
                name: "push day - morning".to_string(),
                status: "completed".to_string(),
                start_time: Some("07:05".to_string()),
            },
            WorkoutSession {
                id: Uuid::new_v4(),
                user_id,
                date: date(2024, 1, 2),
                name: "Push Day".to_string(),
                status: "in_progress".to_string(),
                start_time: None,
            },
        ];

        mark_completion(&mut entries, &sessions);

        assert!(entries[0].is_completed);
        assert!(!entries[1].is_completed); // rest days never complete
    }

    #[test]
    fn unnamed_session_never_marks_completion() {
        let schedule_id = Uuid::new_v4();
        let mut entries = vec![CalendarWorkout {
            date: date(2024, 1, 1),
            active_schedule_id: schedule_id,
            daily_template_id: None,
            name: "Push Day".to_string(),
            category: None,
            difficulty: None,
            cardio_type: None,
            start_time: None,
            duration_minutes: None,
            color: None,
            is_rest_day: false,
            is_completed: false,
        }];
        let sessions = vec![WorkoutSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: date(2024, 1, 1),
            name: "  ".to_string(),
            status: "completed".to_string(),
            start_time: None,
        }];

        mark_completion(&mut entries, &sessions);
        assert!(!entries[0].is_completed);
        assert!(!titles_match("Push Day", ""));
        assert!(!titles_match("", "Push Day"));
    }

    #[test]
    fn schedule_outside_window_yields_nothing() {
        let template_id = Uuid::new_v4();
        let run = daily("Morning Run", None);
        let slots_vec = full_week_slots(template_id, &[(2, run.id)]);
        // Ends well before the queried window opens.
        let schedule = schedule(template_id, date(2024, 1, 1), Some(date(2024, 1, 10)));

        let slot_map = index_slots(&slots_vec);
        let daily_map: HashMap<Uuid, &DailyTemplate> =
            std::iter::once((run.id, &run)).collect();

        let entries = expand_schedule(
            &schedule,
            &slot_map,
            &daily_map,
            &HashMap::new(),
            date(2024, 2, 1),
            date(2024, 2, 29),
        );

        assert!(entries.is_empty());
    }

    #[test]
    fn incomplete_or_mismatched_sessions_do_not_mark() {
        let schedule_id = Uuid::new_v4();
        let mut entries = vec![CalendarWorkout {
            date: date(2024, 1, 1),
            active_schedule_id: schedule_id,
            daily_template_id: None,
            name: "Leg Day".to_string(),
            category: None,
            difficulty: None,
            cardio_type: None,
            start_time: None,
            duration_minutes: None,
            color: None,
            is_rest_day: false,
            is_completed: false,
        }];
        let sessions = vec![WorkoutSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: date(2024, 1, 1),
            name: "Swim".to_string(),
            status: "completed".to_string(),
            start_time: None,
        }];

        mark_completion(&mut entries, &sessions);
        assert!(!entries[0].is_completed);
    }
}
