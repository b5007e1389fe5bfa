use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{error_response, ApiResult, UserQuery};
use crate::models::{ActivateScheduleRequest, ActiveSchedule, UpdateActiveScheduleRequest};
use crate::services::ActiveScheduleService;

#[derive(Clone)]
pub struct ActiveSchedulesState {
    pub service: ActiveScheduleService,
}

pub fn active_schedule_routes(db: PgPool) -> Router {
    let state = ActiveSchedulesState {
        service: ActiveScheduleService::new(db),
    };

    Router::new()
        .route("/", get(list_schedules).post(activate_schedule))
        .route(
            "/:schedule_id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/:schedule_id/toggle", post(toggle_schedule))
        .with_state(state)
}

pub async fn list_schedules(
    State(state): State<ActiveSchedulesState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<ActiveSchedule>> {
    state
        .service
        .list(query.user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_schedule(
    State(state): State<ActiveSchedulesState>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<ActiveSchedule> {
    state
        .service
        .get(query.user_id, schedule_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Binds a weekly template to a date range. Inverted ranges are rejected
/// before persistence; a missing template is a 404.
pub async fn activate_schedule(
    State(state): State<ActiveSchedulesState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<ActivateScheduleRequest>,
) -> ApiResult<ActiveSchedule> {
    state
        .service
        .activate(query.user_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn update_schedule(
    State(state): State<ActiveSchedulesState>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(request): Json<UpdateActiveScheduleRequest>,
) -> ApiResult<ActiveSchedule> {
    state
        .service
        .update(query.user_id, schedule_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn toggle_schedule(
    State(state): State<ActiveSchedulesState>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<ActiveSchedule> {
    state
        .service
        .toggle(query.user_id, schedule_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_schedule(
    State(state): State<ActiveSchedulesState>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Value> {
    state
        .service
        .delete(query.user_id, schedule_id)
        .await
        .map(|_| Json(json!({ "success": true })))
        .map_err(error_response)
}
