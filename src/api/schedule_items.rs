use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{error_response, ApiResult};
use crate::models::{
    CreateScheduleItemRequest, DeleteScope, RecurrenceRule, ScheduleItem, ScheduleWeek,
    UpdateScheduleItemRequest,
};
use crate::services::recurrence::expand_recurrence;
use crate::services::ScheduleItemService;

#[derive(Clone)]
pub struct ScheduleItemsState {
    pub service: ScheduleItemService,
}

pub fn schedule_item_routes(db: PgPool) -> Router {
    let state = ScheduleItemsState {
        service: ScheduleItemService::new(db),
    };

    Router::new()
        .route("/week", get(get_week))
        .route("/items", post(create_item))
        .route("/items/:item_id", put(update_item).delete(delete_item))
        .route("/expand", post(expand))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub user_id: Uuid,
    pub week_start: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ItemUserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DeleteItemQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub scope: DeleteScope,
    pub occurrence_date: Option<NaiveDate>,
}

/// Weekly-keyed document: stored items plus virtual occurrences projected
/// into the requested week.
pub async fn get_week(
    State(state): State<ScheduleItemsState>,
    Query(query): Query<WeekQuery>,
) -> ApiResult<ScheduleWeek> {
    state
        .service
        .get_week(query.user_id, query.week_start)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn create_item(
    State(state): State<ScheduleItemsState>,
    Query(query): Query<ItemUserQuery>,
    Json(request): Json<CreateScheduleItemRequest>,
) -> ApiResult<ScheduleItem> {
    state
        .service
        .create_item(query.user_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Updates the origin item; for recurring items this edits the series.
pub async fn update_item(
    State(state): State<ScheduleItemsState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<ItemUserQuery>,
    Json(request): Json<UpdateScheduleItemRequest>,
) -> ApiResult<ScheduleItem> {
    state
        .service
        .update_item(query.user_id, item_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Delete with occurrence-level granularity: `scope=this|future|all`.
/// `occurrence_date` targets the occurrence for `this` and `future`;
/// virtual occurrences are addressed through their origin id.
pub async fn delete_item(
    State(state): State<ScheduleItemsState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<DeleteItemQuery>,
) -> ApiResult<Value> {
    state
        .service
        .delete_item(query.user_id, item_id, query.scope, query.occurrence_date)
        .await
        .map(|_| Json(json!({ "success": true })))
        .map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    pub rule: RecurrenceRule,
    pub origin_date: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Pure expansion of a rule over a window; useful for previewing a series
/// before saving it.
pub async fn expand(Json(request): Json<ExpandRequest>) -> Json<Vec<NaiveDate>> {
    Json(expand_recurrence(
        &request.rule,
        request.origin_date,
        request.start,
        request.end,
    ))
}
