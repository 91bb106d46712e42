use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IrrigationError;
use crate::predictor::PredictionResult;
use crate::weather::models::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationAction {
    Start,
    Stop,
    Hold,
    Alarm,
}

impl IrrigationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Hold => "hold",
            Self::Alarm => "alarm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggeredBy {
    Rule,
    Llm,
}

impl TriggeredBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Llm => "llm",
        }
    }
}

/// One decision per policy invocation; appended to the irrigation log.
#[derive(Debug, Clone, Serialize)]
pub struct IrrigationDecision {
    pub action: IrrigationAction,
    pub reason: String,
    pub triggered_by: TriggeredBy,
    pub decided_at: DateTime<Utc>,
}

/// Validated soil-moisture thresholds. Private fields so an inverted pair can
/// never exist past construction.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    low: f64,
    high: f64,
}

impl Thresholds {
    pub fn new(low: f64, high: f64) -> Result<Self, IrrigationError> {
        if low >= high {
            return Err(IrrigationError::InvalidThresholdConfig { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

/// Deterministic rule-based irrigation policy.
///
/// Rules are evaluated in priority order, first match wins:
///   1. predicted moisture below `low` and no rain coming → Start
///   2. predicted moisture above `high` → Stop
///   3. rain coming and moisture not below `low` → Hold (defer to rain)
///   4. otherwise → Hold (within normal range)
/// A prediction under the confidence floor downgrades Start/Stop to Hold;
/// the policy never acts on a low-confidence prediction.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    thresholds: Thresholds,
    confidence_floor: f64,
}

impl DecisionPolicy {
    pub fn new(thresholds: Thresholds, confidence_floor: f64) -> Self {
        Self {
            thresholds,
            confidence_floor,
        }
    }

    pub fn decide(
        &self,
        prediction: &PredictionResult,
        weather: &WeatherSnapshot,
    ) -> IrrigationDecision {
        let rain = weather.rain_expected();
        let moisture = prediction.predicted_moisture;
        let low = self.thresholds.low();
        let high = self.thresholds.high();

        let (action, reason) = if moisture < low && !rain {
            (
                IrrigationAction::Start,
                format!(
                    "predicted moisture {moisture:.1}% is below the {low:.1}% threshold and the next-day forecast shows no rain"
                ),
            )
        } else if moisture > high {
            (
                IrrigationAction::Stop,
                format!("predicted moisture {moisture:.1}% is above the {high:.1}% threshold"),
            )
        } else if rain && moisture >= low {
            (
                IrrigationAction::Hold,
                "rain expected in the next-day forecast; deferring irrigation".to_owned(),
            )
        } else {
            (IrrigationAction::Hold, "within normal range".to_owned())
        };

        if prediction.confidence < self.confidence_floor
            && matches!(action, IrrigationAction::Start | IrrigationAction::Stop)
        {
            return IrrigationDecision {
                action: IrrigationAction::Hold,
                reason: format!(
                    "low model confidence ({:.2} below floor {:.2}); holding instead of {}",
                    prediction.confidence,
                    self.confidence_floor,
                    action.as_str()
                ),
                triggered_by: TriggeredBy::Rule,
                decided_at: Utc::now(),
            };
        }

        IrrigationDecision {
            action,
            reason,
            triggered_by: TriggeredBy::Rule,
            decided_at: Utc::now(),
        }
    }

    /// Degraded rule-path decision when prediction or weather inputs are not
    /// usable; the interaction still produces an auditable Hold.
    pub fn hold_degraded(&self, reason: impl Into<String>) -> IrrigationDecision {
        IrrigationDecision {
            action: IrrigationAction::Hold,
            reason: reason.into(),
            triggered_by: TriggeredBy::Rule,
            decided_at: Utc::now(),
        }
    }
}
