use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One soil/environment sample. Immutable once produced; the predictor
/// consumes a bounded window of these ordered by `recorded_at`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: Uuid,
    pub sensor_id: String,
    pub recorded_at: DateTime<Utc>,
    /// Volumetric soil moisture, percent of saturation (0–100)
    pub soil_moisture: f64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Lux
    pub light: f64,
    /// Millimetres since the previous sample
    pub rainfall: f64,
}

/// Persisted form of an `IrrigationDecision` as read back from the log.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DecisionRow {
    pub id: Uuid,
    pub action: String,
    pub reason: String,
    pub triggered_by: String,
    pub decided_at: DateTime<Utc>,
}

/// Persisted form of an `AlarmEvent` as read back from the log.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlarmRow {
    pub id: Uuid,
    pub severity: String,
    pub metric: String,
    pub observed_value: f64,
    pub threshold: f64,
    pub raised_at: DateTime<Utc>,
}
