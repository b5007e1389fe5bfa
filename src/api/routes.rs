use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::active_schedules::active_schedule_routes;
use super::calendar::calendar_routes;
use super::daily_templates::daily_template_routes;
use super::health::health_check;
use super::schedule_items::schedule_item_routes;
use super::schedule_templates::schedule_template_routes;
use super::weekly_templates::weekly_template_routes;

pub fn create_routes(db: PgPool) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/calendar", calendar_routes(db.clone()))
        .nest("/api/schedule", schedule_item_routes(db.clone()))
        .nest("/api/daily-templates", daily_template_routes(db.clone()))
        .nest("/api/weekly-templates", weekly_template_routes(db.clone()))
        .nest("/api/schedule-templates", schedule_template_routes(db.clone()))
        .nest("/api/active-schedules", active_schedule_routes(db))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
