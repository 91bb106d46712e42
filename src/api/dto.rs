use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::control::DeviceStatus;
use crate::db::models::{AlarmRow, DecisionRow, SensorReading};
use crate::policy::IrrigationDecision;
use crate::router::RouterResponse;
use crate::weather::models::WeatherSnapshot;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommandRequest {
    /// Free-text user utterance, e.g. "北京天气如何" or "启动灌溉"
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommandResponse {
    pub text: String,
    pub decision: Option<DecisionDto>,
    pub weather: Option<WeatherSnapshotDto>,
}

impl From<RouterResponse> for CommandResponse {
    fn from(r: RouterResponse) -> Self {
        Self {
            text: r.text,
            decision: r.decision.map(Into::into),
            weather: r.weather.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecisionDto {
    pub action: String,
    pub reason: String,
    pub triggered_by: String,
    pub decided_at: DateTime<Utc>,
}

impl From<IrrigationDecision> for DecisionDto {
    fn from(d: IrrigationDecision) -> Self {
        Self {
            action: d.action.as_str().to_owned(),
            reason: d.reason,
            triggered_by: d.triggered_by.as_str().to_owned(),
            decided_at: d.decided_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherSnapshotDto {
    pub city: String,
    pub adcode: String,
    pub report_time: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub condition: String,
    /// Relative humidity percentage
    pub humidity: f64,
    pub wind_direction: String,
    pub wind_power: String,
    pub forecast: Vec<ForecastDayDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastDayDto {
    pub date: String,
    pub day_condition: String,
    pub night_condition: String,
    pub day_temp: f64,
    pub night_temp: f64,
}

impl From<WeatherSnapshot> for WeatherSnapshotDto {
    fn from(w: WeatherSnapshot) -> Self {
        Self {
            city: w.city,
            adcode: w.adcode,
            report_time: w.report_time,
            temperature: w.live.temperature,
            condition: w.live.condition,
            humidity: w.live.humidity,
            wind_direction: w.live.wind_direction,
            wind_power: w.live.wind_power,
            forecast: w
                .forecast
                .into_iter()
                .map(|day| ForecastDayDto {
                    date: day.date,
                    day_condition: day.day_condition,
                    night_condition: day.night_condition,
                    day_temp: day.day_temp,
                    night_temp: day.night_temp,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorReadingDto {
    pub id: Uuid,
    pub sensor_id: String,
    pub recorded_at: DateTime<Utc>,
    /// Percent of saturation
    pub soil_moisture: f64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Lux
    pub light: f64,
    /// Millimetres since the previous sample
    pub rainfall: f64,
}

impl From<SensorReading> for SensorReadingDto {
    fn from(r: SensorReading) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            recorded_at: r.recorded_at,
            soil_moisture: r.soil_moisture,
            temperature: r.temperature,
            light: r.light,
            rainfall: r.rainfall,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecisionLogDto {
    pub id: Uuid,
    pub action: String,
    pub reason: String,
    pub triggered_by: String,
    pub decided_at: DateTime<Utc>,
}

impl From<DecisionRow> for DecisionLogDto {
    fn from(r: DecisionRow) -> Self {
        Self {
            id: r.id,
            action: r.action,
            reason: r.reason,
            triggered_by: r.triggered_by,
            decided_at: r.decided_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlarmLogDto {
    pub id: Uuid,
    pub severity: String,
    pub metric: String,
    pub observed_value: f64,
    pub threshold: f64,
    pub raised_at: DateTime<Utc>,
}

impl From<AlarmRow> for AlarmLogDto {
    fn from(r: AlarmRow) -> Self {
        Self {
            id: r.id,
            severity: r.severity,
            metric: r.metric,
            observed_value: r.observed_value,
            threshold: r.threshold,
            raised_at: r.raised_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceStatusDto {
    pub state: String,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_minutes: Option<f64>,
    pub remaining_minutes: Option<f64>,
    pub duration_minutes: Option<u64>,
}

impl From<DeviceStatus> for DeviceStatusDto {
    fn from(s: DeviceStatus) -> Self {
        Self {
            state: match s.state {
                crate::control::DeviceState::Running => "running".to_owned(),
                crate::control::DeviceState::Stopped => "stopped".to_owned(),
            },
            started_at: s.started_at,
            elapsed_minutes: s.elapsed_minutes,
            remaining_minutes: s.remaining_minutes,
            duration_minutes: s.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatusDto {
    pub device: DeviceStatusDto,
    pub latest_reading: Option<SensorReadingDto>,
    pub alarms_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlarmToggle {
    pub enabled: bool,
}
