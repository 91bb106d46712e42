pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::alarm::AlarmEvaluator;
use crate::control::IrrigationController;
use crate::reading_cache::ReadingCache;
use crate::router::CommandRouter;

use handlers::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub router: Arc<CommandRouter>,
    pub controller: Arc<IrrigationController>,
    pub alarm: Arc<AlarmEvaluator>,
    pub cache: ReadingCache,
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/command", post(handlers::post_command))
        .route("/status", get(handlers::get_status))
        .route("/sensors/latest", get(handlers::get_latest_readings))
        .route("/sensors/{sensor_id}", get(handlers::get_sensor_readings))
        .route("/decisions", get(handlers::get_decisions))
        .route("/alarms", get(handlers::get_alarms))
        .route("/alarms/enabled", put(handlers::put_alarm_enabled))
        .with_state(state)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}
