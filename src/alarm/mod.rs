use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::db::models::SensorReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Emitted when a reading crosses a configured threshold. Independent
/// lifecycle from `IrrigationDecision`: either may fire without the other.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmEvent {
    pub severity: Severity,
    pub metric: String,
    pub observed_value: f64,
    pub threshold: f64,
    pub raised_at: DateTime<Utc>,
}

/// Threshold checks over the current reading. Pure apart from the enabled
/// toggle, which is checked before any evaluation: disabled means an empty
/// result and no side effects. Does not consult the predictor.
#[derive(Debug)]
pub struct AlarmEvaluator {
    moisture_threshold: f64,
    temp_high: f64,
    enabled: AtomicBool,
}

impl AlarmEvaluator {
    pub fn new(config: &Config) -> Self {
        Self {
            moisture_threshold: config.alarm_moisture_threshold,
            temp_high: config.alarm_temp_high,
            enabled: AtomicBool::new(config.alarm_enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn evaluate(&self, reading: &SensorReading) -> Vec<AlarmEvent> {
        if !self.is_enabled() {
            return Vec::new();
        }

        let mut events = Vec::new();
        let now = Utc::now();

        if reading.soil_moisture < self.moisture_threshold {
            // Severity scales with how far below the threshold the soil is.
            let severity = if reading.soil_moisture < self.moisture_threshold * 0.5 {
                Severity::High
            } else if reading.soil_moisture < self.moisture_threshold * 0.75 {
                Severity::Medium
            } else {
                Severity::Low
            };
            events.push(AlarmEvent {
                severity,
                metric: "soil_moisture".to_owned(),
                observed_value: reading.soil_moisture,
                threshold: self.moisture_threshold,
                raised_at: now,
            });
        }

        if reading.temperature > self.temp_high {
            events.push(AlarmEvent {
                severity: Severity::High,
                metric: "temperature".to_owned(),
                observed_value: reading.temperature,
                threshold: self.temp_high,
                raised_at: now,
            });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn evaluator(enabled: bool) -> AlarmEvaluator {
        AlarmEvaluator {
            moisture_threshold: 25.0,
            temp_high: 45.0,
            enabled: AtomicBool::new(enabled),
        }
    }

    fn reading(moisture: f64, temperature: f64) -> SensorReading {
        SensorReading {
            id: Uuid::new_v4(),
            sensor_id: "sensor_001".to_owned(),
            recorded_at: Utc::now(),
            soil_moisture: moisture,
            temperature,
            light: 500.0,
            rainfall: 0.0,
        }
    }

    #[test]
    fn disabled_evaluator_emits_nothing_for_any_input() {
        let eval = evaluator(false);
        assert!(eval.evaluate(&reading(1.0, 90.0)).is_empty());
    }

    #[test]
    fn toggling_enables_and_disables_emission() {
        let eval = evaluator(true);
        assert_eq!(eval.evaluate(&reading(5.0, 20.0)).len(), 1);

        eval.set_enabled(false);
        assert!(!eval.is_enabled());
        assert!(eval.evaluate(&reading(5.0, 20.0)).is_empty());

        eval.set_enabled(true);
        assert_eq!(eval.evaluate(&reading(5.0, 20.0)).len(), 1);
    }

    #[test]
    fn severity_scales_with_moisture_deficit() {
        let eval = evaluator(true);
        assert_eq!(eval.evaluate(&reading(10.0, 20.0))[0].severity, Severity::High);
        assert_eq!(eval.evaluate(&reading(15.0, 20.0))[0].severity, Severity::Medium);
        assert_eq!(eval.evaluate(&reading(22.0, 20.0))[0].severity, Severity::Low);
    }

    #[test]
    fn healthy_reading_emits_nothing() {
        let eval = evaluator(true);
        assert!(eval.evaluate(&reading(55.0, 25.0)).is_empty());
    }

    #[test]
    fn over_temperature_fires_alongside_dry_soil() {
        let eval = evaluator(true);
        let events = eval.evaluate(&reading(10.0, 50.0));
        assert_eq!(events.len(), 2);
        let metrics: Vec<&str> = events.iter().map(|e| e.metric.as_str()).collect();
        assert!(metrics.contains(&"soil_moisture"));
        assert!(metrics.contains(&"temperature"));
    }
}
