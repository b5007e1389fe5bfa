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
use crate::models::{CreateDailyTemplateRequest, DailyTemplate, UpdateDailyTemplateRequest};
use crate::services::DailyTemplateService;

#[derive(Clone)]
pub struct DailyTemplatesState {
    pub service: DailyTemplateService,
}

pub fn daily_template_routes(db: PgPool) -> Router {
    let state = DailyTemplatesState {
        service: DailyTemplateService::new(db),
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
    State(state): State<DailyTemplatesState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<DailyTemplate>> {
    state
        .service
        .list(query.user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_template(
    State(state): State<DailyTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<DailyTemplate> {
    state
        .service
        .get(query.user_id, template_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn create_template(
    State(state): State<DailyTemplatesState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<CreateDailyTemplateRequest>,
) -> ApiResult<DailyTemplate> {
    state
        .service
        .create(query.user_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn update_template(
    State(state): State<DailyTemplatesState>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(request): Json<UpdateDailyTemplateRequest>,
) -> ApiResult<DailyTemplate> {
    state
        .service
        .update(query.user_id, template_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Weekly slots pointing at the deleted template fall back to rest.
pub async fn delete_template(
    State(state): State<DailyTemplatesState>,
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
