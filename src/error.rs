use thiserror::Error;

/// Failure kinds surfaced by the decision core. Apart from
/// `InvalidThresholdConfig`, which aborts startup, every variant degrades the
/// interaction it occurred in rather than the whole service.
#[derive(Debug, Error)]
pub enum IrrigationError {
    #[error("unknown city: {0}")]
    UnknownCity(String),

    #[error("weather provider unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("not enough readings to predict from")]
    InsufficientData,

    #[error("LLM agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("failed to write to the irrigation log: {0}")]
    LogWrite(#[source] sqlx::Error),

    #[error("moisture thresholds are inverted: low {low} must be below high {high}")]
    InvalidThresholdConfig { low: f64, high: f64 },
}
