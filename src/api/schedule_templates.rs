use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{error_response, ApiResult, UserQuery};
use crate::models::{
    GenerateTemplatesRequest, SaveScheduleTemplateRequest, ScheduleItem, ScheduleTemplate,
};
use crate::services::{ScheduleTemplateService, TemplateGenerationService};

#[derive(Clone)]
pub struct ScheduleTemplatesState {
    pub service: ScheduleTemplateService,
    pub generator: TemplateGenerationService,
}

pub fn schedule_template_routes(db: PgPool) -> Router {
    let state = ScheduleTemplatesState {
        service: ScheduleTemplateService::new(db.clone()),
        generator: TemplateGenerationService::new(db),
    };

    Router::new()
        .route("/", get(list_templates).post(save_template))
        .route("/generate", post(generate_templates))
        .route("/:template_id", get(get_template).delete(delete_template))
        .route("/:template_id/apply", post(apply_template))
        .with_state(state)
}

pub async fn list_templates(
    State(state): State<ScheduleTemplatesState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<ScheduleTemplate>> {
    state
        .service
        .list(query.user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_template(
    State(state): State<ScheduleTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<ScheduleTemplate> {
    state
        .service
        .get(query.user_id, template_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn save_template(
    State(state): State<ScheduleTemplatesState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<SaveScheduleTemplateRequest>,
) -> ApiResult<ScheduleTemplate> {
    state
        .service
        .save(query.user_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_template(
    State(state): State<ScheduleTemplatesState>,
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

#[derive(Debug, Deserialize)]
pub struct ApplyTemplateRequest {
    pub week_start: NaiveDate,
}

/// Instantiates the bundle into a week document and bumps usage_count.
pub async fn apply_template(
    State(state): State<ScheduleTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(request): Json<ApplyTemplateRequest>,
) -> ApiResult<Vec<ScheduleItem>> {
    state
        .service
        .apply(query.user_id, template_id, request.week_start)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Heuristic candidate generation; nothing is persisted until the caller
/// saves one of the returned bundles.
pub async fn generate_templates(
    State(state): State<ScheduleTemplatesState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<GenerateTemplatesRequest>,
) -> ApiResult<Vec<ScheduleTemplate>> {
    state
        .generator
        .generate(query.user_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}
