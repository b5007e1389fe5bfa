use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{error_response, ApiResult, UserQuery};
use crate::models::{CreateWeeklyTemplateRequest, UpdateWeeklyTemplateRequest, WeeklyTemplate};
use crate::services::WeeklyTemplateService;

#[derive(Clone)]
pub struct WeeklyTemplatesState {
    pub service: WeeklyTemplateService,
}

pub fn weekly_template_routes(db: PgPool) -> Router {
    let state = WeeklyTemplatesState {
        service: WeeklyTemplateService::new(db),
    };

    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/:template_id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .with_state(state)
}

pub async fn list_templates(
    State(state): State<WeeklyTemplatesState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<WeeklyTemplate>> {
    state
        .service
        .list(query.user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_template(
    State(state): State<WeeklyTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<WeeklyTemplate> {
    state
        .service
        .get(query.user_id, template_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn create_template(
    State(state): State<WeeklyTemplatesState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<CreateWeeklyTemplateRequest>,
) -> ApiResult<WeeklyTemplate> {
    state
        .service
        .create(query.user_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn update_template(
    State(state): State<WeeklyTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(request): Json<UpdateWeeklyTemplateRequest>,
) -> ApiResult<WeeklyTemplate> {
    state
        .service
        .update(query.user_id, template_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Deleting a pattern also removes the active schedules built on it.
pub async fn delete_template(
    State(state): State<WeeklyTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Value> {
    state
        .service
        .delete(query.user_id, template_id)
        .await
        .map(|_| Json(json!({ "success": true })))
        .map_err(error_response)
}
