// API routes and handlers

pub mod active_schedules;
pub mod calendar;
pub mod daily_templates;
pub mod health;
pub mod routes;
pub mod schedule_items;
pub mod schedule_templates;
pub mod weekly_templates;

use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::services::ScheduleError;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error_code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error_code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Caller identification; authentication is handled outside this service.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

/// Maps the service error taxonomy onto HTTP. Storage failures are logged
/// in full and surfaced as a generic retryable error, never with internals.
pub fn error_response(err: ScheduleError) -> (StatusCode, Json<ApiError>) {
    match err {
        ScheduleError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("validation_error", &message)),
        ),
        ScheduleError::NotFound(message) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("not_found", &message)),
        ),
        ScheduleError::Database(source) => {
            error!(error = %source, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("internal_error", "storage failure, please retry")),
            )
        }
    }
}
