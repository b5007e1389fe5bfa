use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;

use super::{error_response, ApiResult};
use crate::models::{CalendarQuery, CalendarResponse, CalendarWorkout};
use crate::services::CalendarService;

#[derive(Clone)]
pub struct CalendarState {
    pub service: CalendarService,
}

pub fn calendar_routes(db: PgPool) -> Router {
    let state = CalendarState {
        service: CalendarService::new(db),
    };

    Router::new()
        .route("/", get(get_calendar))
        .route("/workouts", get(get_materialized_workouts))
        .with_state(state)
}

/// Materialized template workouts merged with ad-hoc item occurrences for
/// the window. Read-only; recomputed on every request.
pub async fn get_calendar(
    State(state): State<CalendarState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<CalendarResponse> {
    state
        .service
        .calendar(query.user_id, query.start, query.end)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_materialized_workouts(
    State(state): State<CalendarState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Vec<CalendarWorkout>> {
    state
        .service
        .materialize_calendar(query.user_id, query.start, query.end)
        .await
        .map(Json)
        .map_err(error_response)
}
