use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::IrrigationError;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<IrrigationError>() {
            Some(IrrigationError::UnknownCity(_)) => StatusCode::NOT_FOUND,
            Some(IrrigationError::WeatherUnavailable(_) | IrrigationError::AgentUnavailable(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Some(IrrigationError::InsufficientData) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}
