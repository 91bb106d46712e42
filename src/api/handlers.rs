use axum::{
    extract::{Path, State},
    Json,
};
use utoipa::OpenApi;

use super::dto::{
    AlarmLogDto, AlarmToggle, CommandRequest, CommandResponse, DecisionLogDto, SensorReadingDto,
    SystemStatusDto,
};
use super::{errors::AppError, AppState};
use crate::db::models::SensorReading;
use crate::sink;

/// Route a free-text command through the decision core.
#[utoipa::path(
    post,
    path = "/command",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Routed response", body = CommandResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "commands"
)]
pub async fn post_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    // The router never fails an interaction; external failures come back as
    // degraded response text.
    let response = state.router.route(&request.text).await;
    Json(response.into())
}

/// Device state, latest cached reading, and the alarm toggle.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "System status", body = SystemStatusDto),
    ),
    tag = "status"
)]
pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatusDto> {
    let device = state.controller.status().await;
    let latest_reading = state.cache.latest_reading().await;
    Json(SystemStatusDto {
        device: device.into(),
        latest_reading: latest_reading.map(Into::into),
        alarms_enabled: state.alarm.is_enabled(),
    })
}

/// Fetch the latest reading for every known sensor (one row per sensor).
#[utoipa::path(
    get,
    path = "/sensors/latest",
    responses(
        (status = 200, description = "Latest sensor readings", body = Vec<SensorReadingDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_latest_readings(
    State(state): State<AppState>,
) -> Result<Json<Vec<SensorReadingDto>>, AppError> {
    let rows = sqlx::query_as::<_, SensorReading>(
        r#"
        SELECT DISTINCT ON (sensor_id)
            id, sensor_id, recorded_at, soil_moisture, temperature, light, rainfall
        FROM sensor_readings
        ORDER BY sensor_id, recorded_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Fetch the most recent readings for a specific sensor.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor ID"),
    ),
    responses(
        (status = 200, description = "Sensor readings", body = Vec<SensorReadingDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor_readings(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<Json<Vec<SensorReadingDto>>, AppError> {
    let rows = sqlx::query_as::<_, SensorReading>(
        r#"
        SELECT id, sensor_id, recorded_at, soil_moisture, temperature, light, rainfall
        FROM sensor_readings
        WHERE sensor_id = $1
        ORDER BY recorded_at DESC
        LIMIT 100
        "#,
    )
    .bind(sensor_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Most recent irrigation decisions from the audit log.
#[utoipa::path(
    get,
    path = "/decisions",
    responses(
        (status = 200, description = "Recent irrigation decisions", body = Vec<DecisionLogDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "log"
)]
pub async fn get_decisions(
    State(state): State<AppState>,
) -> Result<Json<Vec<DecisionLogDto>>, AppError> {
    let rows = sink::recent_decisions(&state.pool, 50).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Most recent alarm events from the audit log.
#[utoipa::path(
    get,
    path = "/alarms",
    responses(
        (status = 200, description = "Recent alarm events", body = Vec<AlarmLogDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "log"
)]
pub async fn get_alarms(State(state): State<AppState>) -> Result<Json<Vec<AlarmLogDto>>, AppError> {
    let rows = sink::recent_alarms(&state.pool, 50).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Enable or disable alarm evaluation.
#[utoipa::path(
    put,
    path = "/alarms/enabled",
    request_body = AlarmToggle,
    responses(
        (status = 200, description = "Resulting toggle state", body = AlarmToggle),
    ),
    tag = "log"
)]
pub async fn put_alarm_enabled(
    State(state): State<AppState>,
    Json(toggle): Json<AlarmToggle>,
) -> Json<AlarmToggle> {
    state.alarm.set_enabled(toggle.enabled);
    Json(AlarmToggle {
        enabled: state.alarm.is_enabled(),
    })
}

// ---------------------------------------------------------------------------
// OpenAPI document struct (used in api/mod.rs)
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        post_command,
        get_status,
        get_latest_readings,
        get_sensor_readings,
        get_decisions,
        get_alarms,
        put_alarm_enabled,
    ),
    components(schemas(
        CommandRequest,
        CommandResponse,
        super::dto::DecisionDto,
        super::dto::WeatherSnapshotDto,
        super::dto::ForecastDayDto,
        super::dto::DeviceStatusDto,
        SystemStatusDto,
        SensorReadingDto,
        DecisionLogDto,
        AlarmLogDto,
        AlarmToggle,
    )),
    tags(
        (name = "commands", description = "Conversational command routing"),
        (name = "status", description = "Device and cache status"),
        (name = "sensors", description = "Sensor reading endpoints"),
        (name = "log", description = "Decision and alarm audit log"),
    ),
    info(
        title = "Smart Irrigation Service API",
        version = "0.1.0",
        description = "REST API for the smart-irrigation decision service"
    )
)]
pub struct ApiDoc;
