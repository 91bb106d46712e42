use serde::Serialize;

use crate::db::models::SensorReading;
use crate::error::IrrigationError;
use crate::weather::models::WeatherSnapshot;

pub const MODEL_VERSION: &str = "linear-v1";

/// Derived per call; never persisted standalone.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    /// Percent of saturation (0–100)
    pub predicted_moisture: f64,
    /// 0–1; how much the policy should trust this prediction
    pub confidence: f64,
    pub model_version: &'static str,
}

/// Stateless mapping from a recent-reading window (plus optional weather) to a
/// predicted soil-moisture value. Injected at construction so tests can swap
/// in a canned predictor.
pub trait Predictor: Send + Sync {
    fn predict(
        &self,
        history: &[SensorReading],
        weather: Option<&WeatherSnapshot>,
    ) -> Result<PredictionResult, IrrigationError>;
}

// Training-time feature ranges. Out-of-range inputs are clamped, not rejected.
const MOISTURE_RANGE: (f64, f64) = (0.0, 100.0);
const TEMPERATURE_RANGE: (f64, f64) = (-40.0, 60.0);
const LIGHT_RANGE: (f64, f64) = (0.0, 1000.0);
const RAINFALL_RANGE: (f64, f64) = (0.0, 50.0);
const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);

// Fixed regression weights, in normalized feature space. Heat and light dry
// the soil; rainfall and air humidity replenish it.
const W_TEMPERATURE: f64 = 0.06;
const W_LIGHT: f64 = 0.04;
const W_RAINFALL: f64 = 0.10;
const W_HUMIDITY: f64 = 0.03;
const BIAS: f64 = 0.015;

/// Number of readings at which history depth stops limiting confidence.
const FULL_HISTORY: usize = 4;
/// Moisture variance at which confidence bottoms out.
const VARIANCE_CEILING: f64 = 400.0;

/// Trivial linear regression over the latest reading, with a confidence
/// estimate from history depth and moisture variance. No online learning;
/// weights are fixed at build time.
#[derive(Debug, Default)]
pub struct LinearPredictor;

impl LinearPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for LinearPredictor {
    fn predict(
        &self,
        history: &[SensorReading],
        weather: Option<&WeatherSnapshot>,
    ) -> Result<PredictionResult, IrrigationError> {
        let latest = history.last().ok_or(IrrigationError::InsufficientData)?;

        let moisture = normalize(latest.soil_moisture, MOISTURE_RANGE);
        let temperature = normalize(latest.temperature, TEMPERATURE_RANGE);
        let light = normalize(latest.light, LIGHT_RANGE);
        let rainfall = normalize(latest.rainfall, RAINFALL_RANGE);
        // Without a snapshot, assume neutral air humidity.
        let humidity = weather
            .map(|w| normalize(w.live.humidity, HUMIDITY_RANGE))
            .unwrap_or(0.5);

        let predicted = (moisture - W_TEMPERATURE * temperature - W_LIGHT * light
            + W_RAINFALL * rainfall
            + W_HUMIDITY * humidity
            - BIAS)
            .clamp(0.0, 1.0);

        Ok(PredictionResult {
            predicted_moisture: predicted * 100.0,
            confidence: confidence(history),
            model_version: MODEL_VERSION,
        })
    }
}

fn normalize(value: f64, (lo, hi): (f64, f64)) -> f64 {
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Confidence grows with history depth and shrinks with moisture variance.
/// Always within [0, 1].
fn confidence(history: &[SensorReading]) -> f64 {
    let depth = (history.len() as f64 / FULL_HISTORY as f64).min(1.0);
    let mean = history.iter().map(|r| r.soil_moisture).sum::<f64>() / history.len() as f64;
    let variance = history
        .iter()
        .map(|r| (r.soil_moisture - mean).powi(2))
        .sum::<f64>()
        / history.len() as f64;
    let stability = 1.0 - (variance / VARIANCE_CEILING).min(1.0);
    (depth * (0.4 + 0.6 * stability)).clamp(0.0, 1.0)
}
