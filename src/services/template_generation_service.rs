use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    GenerateTemplatesRequest, ScheduleTemplate, ScheduleTemplateItem, WorkoutTemplate,
};
use crate::services::errors::{ScheduleError, ScheduleResult};
use crate::services::workout_store::WorkoutStore;

const DEFAULT_START_TIME: &str = "07:00";
const MAX_CANDIDATES: u8 = 10;

/// Heuristic weekly-plan generator: weighted random sampling from the
/// user's workout templates under hard day-count and difficulty
/// constraints. Focus tags only bias the sampling; they never exclude.
#[derive(Clone)]
pub struct TemplateGenerationService {
    workouts: WorkoutStore,
}

impl TemplateGenerationService {
    pub fn new(db: PgPool) -> Self {
        Self {
            workouts: WorkoutStore::new(db),
        }
    }

    pub async fn generate(
        &self,
        user_id: Uuid,
        request: GenerateTemplatesRequest,
    ) -> ScheduleResult<Vec<ScheduleTemplate>> {
        validate_params(&request)?;

        let pool = self.workouts.list_templates(user_id).await?;
        let candidates = filter_by_difficulty(&pool, request.difficulty.as_deref());
        if candidates.is_empty() {
            return Err(ScheduleError::validation(
                "no workout templates match the requested difficulty",
            ));
        }

        let count = request.candidate_count.clamp(1, MAX_CANDIDATES);
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        let templates = (0..count)
            .map(|i| {
                let days = pick_days(
                    request.days_per_week,
                    &request.preferred_days,
                    request.allow_back_to_back,
                    &mut rng,
                );
                let items = assign_workouts(
                    &days,
                    &candidates,
                    &request.focus_tags,
                    request.allow_back_to_back,
                    request.repeat_interval,
                    &mut rng,
                );
                ScheduleTemplate {
                    id: Uuid::new_v4(),
                    user_id,
                    name: format!("Generated plan {}", i + 1),
                    items: Json(items),
                    is_default: false,
                    usage_count: 0,
                    metadata: Some(serde_json::json!({
                        "generated": true,
                        "days_per_week": request.days_per_week,
                        "difficulty": request.difficulty,
                        "focus_tags": request.focus_tags,
                        "repeat_interval": request.repeat_interval,
                    })),
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect();

        Ok(templates)
    }
}

fn validate_params(request: &GenerateTemplatesRequest) -> ScheduleResult<()> {
    if !(1..=7).contains(&request.days_per_week) {
        return Err(ScheduleError::validation(
            "days_per_week must be between 1 and 7",
        ));
    }
    if request.preferred_days.iter().any(|d| *d > 6) {
        return Err(ScheduleError::validation(
            "preferred_days values must be between 0 and 6",
        ));
    }
    if request.repeat_interval < 1 {
        return Err(ScheduleError::validation(
            "repeat_interval must be at least 1",
        ));
    }
    Ok(())
}

/// Difficulty is a hard constraint when requested: templates without a
/// matching difficulty are excluded, never waved through.
fn filter_by_difficulty<'a>(
    pool: &'a [WorkoutTemplate],
    difficulty: Option<&str>,
) -> Vec<&'a WorkoutTemplate> {
    match difficulty {
        None => pool.iter().collect(),
        Some(wanted) => pool
            .iter()
            .filter(|t| {
                t.difficulty
                    .as_deref()
                    .map_or(false, |d| d.eq_ignore_ascii_case(wanted))
            })
            .collect(),
    }
}

/// Picks exactly `days_per_week` distinct days. Preferred days are taken
/// first; remaining slots are filled randomly, avoiding days adjacent to
/// an already-picked one when `allow_back_to_back` is false and spacing
/// is still possible.
fn pick_days(
    days_per_week: u8,
    preferred: &[u8],
    allow_back_to_back: bool,
    rng: &mut impl Rng,
) -> Vec<i16> {
    let mut picked: Vec<i16> = Vec::new();
    for &day in preferred {
        let day = day as i16;
        if !picked.contains(&day) && picked.len() < days_per_week as usize {
            picked.push(day);
        }
    }

    while picked.len() < days_per_week as usize {
        let remaining: Vec<i16> = (0..7).filter(|d| !picked.contains(d)).collect();
        let spaced: Vec<i16> = remaining
            .iter()
            .copied()
            .filter(|d| !picked.iter().any(|p| (p - d).abs() == 1))
            .collect();
        let choices = if allow_back_to_back || spaced.is_empty() {
            &remaining
        } else {
            &spaced
        };
        // remaining is never empty while picked.len() < 7
        picked.push(*choices.choose(rng).unwrap_or(&remaining[0]));
    }

    picked.sort_unstable();
    picked
}

/// Assigns a workout template to each day by weighted sampling; focus-tag
/// overlap raises a template's weight. The same template is not placed on
/// adjacent days unless allowed or unavoidable.
fn assign_workouts(
    days: &[i16],
    candidates: &[&WorkoutTemplate],
    focus_tags: &[String],
    allow_back_to_back: bool,
    repeat_interval: u32,
    rng: &mut impl Rng,
) -> Vec<ScheduleTemplateItem> {
    let mut items = Vec::with_capacity(days.len());
    let mut previous: Option<(i16, Uuid)> = None;

    for &day in days {
        let eligible: Vec<&WorkoutTemplate> = candidates
            .iter()
            .copied()
            .filter(|t| match previous {
                Some((prev_day, prev_id)) if !allow_back_to_back => {
                    day - prev_day != 1 || t.id != prev_id
                }
                _ => true,
            })
            .collect();
        let eligible = if eligible.is_empty() {
            candidates.to_vec()
        } else {
            eligible
        };

        let chosen = eligible
            .choose_weighted(rng, |t| 1 + focus_overlap(t, focus_tags))
            .map(|t| *t)
            .unwrap_or(eligible[0]);

        items.push(ScheduleTemplateItem {
            item_type: "workout".to_string(),
            title: chosen.name.clone(),
            day,
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: chosen
                .estimated_duration
                .map(|minutes| add_minutes(DEFAULT_START_TIME, minutes)),
            workout_template_id: Some(chosen.id),
            is_recurring: true,
            repeat_interval,
        });
        previous = Some((day, chosen.id));
    }

    items
}

fn focus_overlap(template: &WorkoutTemplate, tags: &[String]) -> u32 {
    let name = template.name.to_lowercase();
    let category = template
        .category
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();
    tags.iter()
        .filter(|tag| {
            let tag = tag.to_lowercase();
            name.contains(&tag) || category == tag
        })
        .count() as u32
}

fn add_minutes(time: &str, minutes: i32) -> String {
    let (h, m) = time
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)))
        .unwrap_or((0, 0));
    let total = (h * 60 + m + minutes.max(0)) % (24 * 60);
    format!("{:02}:{:02}", total / 60, total % 60)
}
