use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};

use crate::agent::{LlmAgent, TOOL_CAPABILITIES};
use crate::alarm::{AlarmEvaluator, AlarmEvent};
use crate::control::IrrigationController;
use crate::error::IrrigationError;
use crate::policy::{DecisionPolicy, IrrigationAction, IrrigationDecision};
use crate::predictor::Predictor;
use crate::reading_cache::ReadingCache;
use crate::sink::LogSink;
use crate::weather::models::WeatherSnapshot;
use crate::weather::{find_city_in_text, WeatherSource};

/// Classified purpose of a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Weather,
    Irrigate,
    Status,
    Unknown,
}

/// Transient parse result; lives only for the duration of one routing call.
#[derive(Debug, Clone)]
pub struct Command {
    pub intent: Intent,
    pub slots: HashMap<String, String>,
    pub raw_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterResponse {
    pub text: String,
    pub decision: Option<IrrigationDecision>,
    pub weather: Option<WeatherSnapshot>,
}

impl RouterResponse {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            decision: None,
            weather: None,
        }
    }
}

// Intent markers, checked in this order; the first matching rule wins. A
// known city name alone is enough to classify as a weather query.
const WEATHER_MARKERS: &[&str] = &["天气", "weather", "预报", "气象"];
const IRRIGATE_MARKERS: &[&str] = &["灌溉", "浇水", "irrigate", "water"];
const STATUS_MARKERS: &[&str] = &["状态", "情况", "status"];

/// Single classification point for free text. Deterministic: the same input
/// and sensor-id table always produce the same intent and slots.
pub fn classify(raw_text: &str, sensor_ids: &[String]) -> Command {
    let lowered = raw_text.to_lowercase();
    let mut slots = HashMap::new();

    if let Some(city) = find_city_in_text(raw_text) {
        slots.insert("city".to_owned(), city.to_owned());
    }
    if let Some(sensor_id) = sensor_ids.iter().find(|id| lowered.contains(&id.to_lowercase())) {
        slots.insert("sensor_id".to_owned(), sensor_id.clone());
    }

    let contains_any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    let intent = if slots.contains_key("city") || contains_any(WEATHER_MARKERS) {
        Intent::Weather
    } else if contains_any(IRRIGATE_MARKERS) {
        Intent::Irrigate
    } else if contains_any(STATUS_MARKERS) {
        Intent::Status
    } else {
        Intent::Unknown
    };

    Command {
        intent,
        slots,
        raw_text: raw_text.to_owned(),
    }
}

/// Routes a user utterance to the weather lookup, the irrigation decision
/// chain, the status report, or the delegated LLM agent.
///
/// Stateless across calls apart from the shared reading/weather cache, which
/// is overwritten (never merged) on each successful lookup. Collaborators are
/// injected as capability traits so every path is testable without network or
/// database access.
pub struct CommandRouter {
    weather: Arc<dyn WeatherSource>,
    predictor: Arc<dyn Predictor>,
    agent: Arc<dyn LlmAgent>,
    sink: Arc<dyn LogSink>,
    alarm: Arc<AlarmEvaluator>,
    controller: Arc<IrrigationController>,
    cache: ReadingCache,
    policy: DecisionPolicy,
    default_city: String,
    sensor_ids: Vec<String>,
    irrigation_duration_minutes: u64,
}

#[allow(clippy::too_many_arguments)]
impl CommandRouter {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        predictor: Arc<dyn Predictor>,
        agent: Arc<dyn LlmAgent>,
        sink: Arc<dyn LogSink>,
        alarm: Arc<AlarmEvaluator>,
        controller: Arc<IrrigationController>,
        cache: ReadingCache,
        policy: DecisionPolicy,
        default_city: String,
        sensor_ids: Vec<String>,
        irrigation_duration_minutes: u64,
    ) -> Self {
        Self {
            weather,
            predictor,
            agent,
            sink,
            alarm,
            controller,
            cache,
            policy,
            default_city,
            sensor_ids,
            irrigation_duration_minutes,
        }
    }

    pub async fn route(&self, raw_text: &str) -> RouterResponse {
        let command = classify(raw_text, &self.sensor_ids);
        match command.intent {
            Intent::Weather => self.handle_weather(&command).await,
            Intent::Irrigate => {
                self.decide_and_apply_for(command.slots.get("sensor_id").map(String::as_str))
                    .await
            }
            Intent::Status => self.handle_status(&command).await,
            Intent::Unknown => self.delegate(&command).await,
        }
    }

    async fn handle_weather(&self, command: &Command) -> RouterResponse {
        let city = command
            .slots
            .get("city")
            .cloned()
            .unwrap_or_else(|| self.default_city.clone());

        match self.weather.get_weather(&city).await {
            Ok(snapshot) => {
                self.cache.set_weather(snapshot.clone()).await;
                RouterResponse {
                    text: snapshot.summary(),
                    decision: None,
                    weather: Some(snapshot),
                }
            }
            Err(e) => {
                warn!(city = %city, error = %e, "Weather lookup failed");
                RouterResponse::text_only(format!("Weather for {city} is unavailable right now: {e}"))
            }
        }
    }

    /// Scheduled-check entry point: decides over the whole reading window.
    pub async fn decide_and_apply(&self) -> RouterResponse {
        self.decide_and_apply_for(None).await
    }

    /// Irrigation decision chain, shared by the IRRIGATE intent and the
    /// scheduled check: predict from the cached reading window, apply the
    /// policy, drive the simulated device, append to the log, raise alarms.
    /// A slotted sensor ID narrows the window to that sensor's readings.
    async fn decide_and_apply_for(&self, sensor_id: Option<&str>) -> RouterResponse {
        let mut history = self.cache.history().await;
        if let Some(id) = sensor_id {
            history.retain(|r| r.sensor_id == id);
        }
        let weather = self.current_weather().await;

        let mut lines = Vec::new();
        let decision = match self.predictor.predict(&history, weather.as_ref()) {
            Ok(prediction) => {
                lines.push(format!(
                    "Predicted soil moisture {:.1}% (confidence {:.2}, model {}).",
                    prediction.predicted_moisture, prediction.confidence, prediction.model_version
                ));
                match weather.as_ref() {
                    Some(snapshot) => self.policy.decide(&prediction, snapshot),
                    None => self
                        .policy
                        .hold_degraded("weather unavailable; holding irrigation"),
                }
            }
            Err(IrrigationError::InsufficientData) => self.policy.hold_degraded("insufficient history"),
            Err(e) => {
                warn!(error = %e, "Prediction failed");
                self.policy.hold_degraded(format!("prediction unavailable: {e}"))
            }
        };

        lines.push(format!(
            "Decision: {} ({})",
            decision.action.as_str(),
            decision.reason
        ));

        match decision.action {
            IrrigationAction::Start => {
                if self.controller.start(self.irrigation_duration_minutes).await {
                    lines.push(format!(
                        "Irrigation started for {} minutes.",
                        self.irrigation_duration_minutes
                    ));
                } else {
                    lines.push("Irrigation is already running.".to_owned());
                }
            }
            IrrigationAction::Stop => {
                if self.controller.stop().await {
                    lines.push("Irrigation stopped.".to_owned());
                } else {
                    lines.push("Irrigation is already stopped.".to_owned());
                }
            }
            IrrigationAction::Hold | IrrigationAction::Alarm => {}
        }

        // A log failure is reported but never invalidates the decision.
        if let Err(e) = self.sink.append_decision(&decision).await {
            error!(error = %e, "Failed to append irrigation decision to the log");
        }

        for alarm in self.raise_alarms().await {
            lines.push(format!(
                "ALARM [{}] {}: observed {:.1}, threshold {:.1}",
                alarm.severity.as_str(),
                alarm.metric,
                alarm.observed_value,
                alarm.threshold
            ));
        }

        RouterResponse {
            text: lines.join("\n"),
            decision: Some(decision),
            weather,
        }
    }

    /// Cached snapshot if present, otherwise a best-effort fetch for the
    /// default city. Missing weather degrades the decision, never the call.
    async fn current_weather(&self) -> Option<WeatherSnapshot> {
        if let Some(snapshot) = self.cache.latest_weather().await {
            return Some(snapshot);
        }
        match self.weather.get_weather(&self.default_city).await {
            Ok(snapshot) => {
                self.cache.set_weather(snapshot.clone()).await;
                Some(snapshot)
            }
            Err(e) => {
                warn!(city = %self.default_city, error = %e, "Weather lookup for decision failed");
                None
            }
        }
    }

    async fn raise_alarms(&self) -> Vec<AlarmEvent> {
        let Some(reading) = self.cache.latest_reading().await else {
            return Vec::new();
        };
        let events = self.alarm.evaluate(&reading);
        for alarm in &events {
            if let Err(e) = self.sink.append_alarm(alarm).await {
                error!(error = %e, metric = %alarm.metric, "Failed to append alarm event to the log");
            }
        }
        events
    }

    async fn handle_status(&self, command: &Command) -> RouterResponse {
        let status = self.controller.status().await;
        let mut lines = vec![match (status.elapsed_minutes, status.remaining_minutes) {
            (Some(elapsed), Some(remaining)) => format!(
                "Irrigation device: running ({elapsed:.1} min elapsed, {remaining:.1} min remaining)"
            ),
            _ => "Irrigation device: stopped".to_owned(),
        }];

        // A slotted sensor ID narrows the report to that sensor's last sample.
        let latest = match command.slots.get("sensor_id") {
            Some(id) => self
                .cache
                .history()
                .await
                .into_iter()
                .rev()
                .find(|r| &r.sensor_id == id),
            None => self.cache.latest_reading().await,
        };

        match latest {
            Some(reading) => lines.push(format!(
                "Latest reading from {}: moisture {:.1}%, temperature {:.1}°C, rainfall {:.1} mm",
                reading.sensor_id, reading.soil_moisture, reading.temperature, reading.rainfall
            )),
            None => lines.push("No sensor readings collected yet.".to_owned()),
        }

        lines.push(format!("Alarms enabled: {}", self.alarm.is_enabled()));

        RouterResponse::text_only(lines.join("\n"))
    }

    async fn delegate(&self, command: &Command) -> RouterResponse {
        match self.agent.complete(&command.raw_text, TOOL_CAPABILITIES).await {
            Ok(answer) => RouterResponse::text_only(answer),
            Err(e) => {
                warn!(error = %e, raw_text = %command.raw_text, "LLM delegation failed");
                RouterResponse::text_only("Unable to process request; the assistant is currently unavailable.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::alarm::AlarmEvent;
    use crate::db::models::SensorReading;
    use crate::policy::Thresholds;
    use crate::predictor::LinearPredictor;
    use crate::weather::models::{ForecastDay, LiveConditions};

    struct StaticWeather(WeatherSnapshot);

    #[async_trait]
    impl WeatherSource for StaticWeather {
        async fn get_weather(&self, _city: &str) -> Result<WeatherSnapshot, IrrigationError> {
            Ok(self.0.clone())
        }
    }

    struct FailingWeather;

    #[async_trait]
    impl WeatherSource for FailingWeather {
        async fn get_weather(&self, city: &str) -> Result<WeatherSnapshot, IrrigationError> {
            Err(IrrigationError::WeatherUnavailable(format!(
                "no route to provider for {city}"
            )))
        }
    }

    struct CountingAgent {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingAgent {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl LlmAgent for CountingAgent {
        async fn complete(
            &self,
            _raw_text: &str,
            _capabilities: &[crate::agent::ToolCapability],
        ) -> Result<String, IrrigationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(IrrigationError::AgentUnavailable("timeout".to_owned()))
            } else {
                Ok("delegated answer".to_owned())
            }
        }
    }

    #[derive(Default)]
    struct CountingSink {
        decisions: AtomicUsize,
        alarms: AtomicUsize,
    }

    #[async_trait]
    impl LogSink for CountingSink {
        async fn append_decision(&self, _d: &IrrigationDecision) -> Result<(), IrrigationError> {
            self.decisions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn append_alarm(&self, _a: &AlarmEvent) -> Result<(), IrrigationError> {
            self.alarms.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl LogSink for FailingSink {
        async fn append_decision(&self, _d: &IrrigationDecision) -> Result<(), IrrigationError> {
            Err(IrrigationError::LogWrite(sqlx::Error::PoolClosed))
        }

        async fn append_alarm(&self, _a: &AlarmEvent) -> Result<(), IrrigationError> {
            Err(IrrigationError::LogWrite(sqlx::Error::PoolClosed))
        }
    }

    fn snapshot(day_condition: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city: "上海".to_owned(),
            adcode: "310000".to_owned(),
            report_time: "2023-05-18 10:00:00".to_owned(),
            live: LiveConditions {
                temperature: 24.0,
                condition: "晴".to_owned(),
                humidity: 50.0,
                wind_direction: "东".to_owned(),
                wind_power: "≤3".to_owned(),
            },
            forecast: vec![ForecastDay {
                date: "2023-05-18".to_owned(),
                day_condition: day_condition.to_owned(),
                night_condition: "多云".to_owned(),
                day_temp: 28.0,
                night_temp: 19.0,
            }],
        }
    }

    fn reading(moisture: f64) -> SensorReading {
        reading_for("sensor_001", moisture)
    }

    fn reading_for(sensor_id: &str, moisture: f64) -> SensorReading {
        SensorReading {
            id: Uuid::new_v4(),
            sensor_id: sensor_id.to_owned(),
            recorded_at: Utc::now(),
            soil_moisture: moisture,
            temperature: 25.0,
            light: 500.0,
            rainfall: 0.0,
        }
    }

    fn alarm_config(enabled: bool) -> crate::config::Config {
        // Only the alarm fields matter here; everything else is inert.
        let mut cfg = test_config();
        cfg.alarm_enabled = enabled;
        cfg
    }

    fn test_config() -> crate::config::Config {
        crate::config::Config {
            database_url: "postgres://unused".to_owned(),
            db_max_connections: 1,
            server_host: "127.0.0.1".to_owned(),
            server_port: 0,
            amap_api_key: String::new(),
            amap_base_url: String::new(),
            default_city: "北京".to_owned(),
            llm_api_key: String::new(),
            llm_base_url: String::new(),
            llm_model: String::new(),
            http_timeout_secs: 1,
            thresholds: Thresholds::new(20.0, 80.0).unwrap(),
            confidence_floor: 0.3,
            alarm_moisture_threshold: 25.0,
            alarm_temp_high: 45.0,
            alarm_enabled: false,
            sensor_ids: vec!["sensor_001".to_owned(), "sensor_002".to_owned()],
            poll_interval_secs: 60,
            check_interval_secs: 60,
            history_window: 12,
            irrigation_duration_minutes: 30,
        }
    }

    struct Fixture {
        router: CommandRouter,
        agent: Arc<CountingAgent>,
        sink: Arc<CountingSink>,
        cache: ReadingCache,
    }

    fn fixture(weather: Arc<dyn WeatherSource>, agent_fails: bool, alarms_on: bool) -> Fixture {
        let cfg = alarm_config(alarms_on);
        let agent = Arc::new(CountingAgent::new(agent_fails));
        let sink = Arc::new(CountingSink::default());
        let cache = ReadingCache::new(cfg.history_window);
        let router = CommandRouter::new(
            weather,
            Arc::new(LinearPredictor::new()),
            agent.clone(),
            sink.clone(),
            Arc::new(AlarmEvaluator::new(&cfg)),
            Arc::new(IrrigationController::new()),
            cache.clone(),
            DecisionPolicy::new(cfg.thresholds, cfg.confidence_floor),
            cfg.default_city.clone(),
            cfg.sensor_ids.clone(),
            cfg.irrigation_duration_minutes,
        );
        Fixture {
            router,
            agent,
            sink,
            cache,
        }
    }

    #[test]
    fn classification_is_idempotent() {
        let sensor_ids = vec!["sensor_001".to_owned()];
        let first = classify("北京天气如何", &sensor_ids);
        let second = classify("北京天气如何", &sensor_ids);
        assert_eq!(first.intent, Intent::Weather);
        assert_eq!(second.intent, Intent::Weather);
        assert_eq!(first.slots.get("city").map(String::as_str), Some("北京"));
        assert_eq!(first.slots.get("city"), second.slots.get("city"));
    }

    #[test]
    fn intent_rules_apply_in_order() {
        let sensor_ids = vec!["sensor_001".to_owned()];
        assert_eq!(classify("上海天气预报", &sensor_ids).intent, Intent::Weather);
        assert_eq!(classify("启动灌溉", &sensor_ids).intent, Intent::Irrigate);
        assert_eq!(classify("please water the field", &sensor_ids).intent, Intent::Irrigate);
        assert_eq!(classify("查看系统状态", &sensor_ids).intent, Intent::Status);
        assert_eq!(classify("讲个笑话", &sensor_ids).intent, Intent::Unknown);
        // City name alone outranks the irrigation verb.
        assert_eq!(classify("成都需要灌溉吗", &sensor_ids).intent, Intent::Weather);
    }

    #[test]
    fn sensor_id_slot_is_extracted_case_insensitively() {
        let sensor_ids = vec!["sensor_001".to_owned()];
        let cmd = classify("浇水 SENSOR_001", &sensor_ids);
        assert_eq!(cmd.intent, Intent::Irrigate);
        assert_eq!(cmd.slots.get("sensor_id").map(String::as_str), Some("sensor_001"));
    }

    #[tokio::test]
    async fn weather_query_is_answered_without_the_agent() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        let response = f.router.route("上海天气预报").await;

        assert!(response.text.contains("上海"));
        assert!(response.text.contains("Forecast"));
        assert!(response.weather.is_some());
        assert_eq!(f.agent.calls.load(Ordering::SeqCst), 0);
        // Successful lookup overwrites the cached snapshot.
        assert!(f.cache.latest_weather().await.is_some());
    }

    #[tokio::test]
    async fn missing_city_falls_back_to_the_default() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        let response = f.router.route("今天天气怎么样").await;
        assert!(response.weather.is_some());
    }

    #[tokio::test]
    async fn weather_failure_degrades_without_crashing() {
        let f = fixture(Arc::new(FailingWeather), false, false);
        let response = f.router.route("北京天气如何").await;
        assert!(response.text.contains("unavailable"));
        assert!(response.weather.is_none());
    }

    #[tokio::test]
    async fn unrecognized_text_is_delegated_to_the_agent() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        let response = f.router.route("讲个笑话").await;
        assert_eq!(response.text, "delegated answer");
        assert_eq!(f.agent.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn agent_failure_produces_a_degraded_message() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), true, false);
        let response = f.router.route("讲个笑话").await;
        assert!(response.text.contains("Unable to process request"));
        assert_eq!(f.agent.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dry_history_and_clear_forecast_start_irrigation() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        for _ in 0..4 {
            f.cache.push_reading(reading(18.0)).await;
        }
        f.cache.set_weather(snapshot("晴")).await;

        let response = f.router.route("启动灌溉").await;
        let decision = response.decision.expect("irrigate path yields a decision");
        assert_eq!(decision.action, IrrigationAction::Start);
        assert_eq!(decision.triggered_by, crate::policy::TriggeredBy::Rule);
        assert!(response.text.contains("Irrigation started"));
        // Exactly one log append: the decision, no alarms (evaluator disabled).
        assert_eq!(f.sink.decisions.load(Ordering::SeqCst), 1);
        assert_eq!(f.sink.alarms.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incoming_rain_holds_instead_of_starting() {
        let f = fixture(Arc::new(StaticWeather(snapshot("小雨"))), false, false);
        for _ in 0..4 {
            f.cache.push_reading(reading(18.0)).await;
        }
        f.cache.set_weather(snapshot("小雨")).await;

        let response = f.router.route("启动灌溉").await;
        assert_eq!(response.decision.unwrap().action, IrrigationAction::Hold);
    }

    #[tokio::test]
    async fn empty_history_degrades_to_hold() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        f.cache.set_weather(snapshot("晴")).await;

        let response = f.router.route("启动灌溉").await;
        let decision = response.decision.unwrap();
        assert_eq!(decision.action, IrrigationAction::Hold);
        assert!(decision.reason.contains("insufficient history"));
        // The degraded hold is still auditable.
        assert_eq!(f.sink.decisions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dry_reading_with_alarms_enabled_appends_alarm_events() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, true);
        for _ in 0..4 {
            f.cache.push_reading(reading(10.0)).await;
        }
        f.cache.set_weather(snapshot("晴")).await;

        let response = f.router.route("启动灌溉").await;
        assert!(response.text.contains("ALARM"));
        assert_eq!(f.sink.decisions.load(Ordering::SeqCst), 1);
        assert_eq!(f.sink.alarms.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn log_write_failure_keeps_the_decision() {
        let cfg = test_config();
        let cache = ReadingCache::new(cfg.history_window);
        let router = CommandRouter::new(
            Arc::new(StaticWeather(snapshot("晴"))),
            Arc::new(LinearPredictor::new()),
            Arc::new(CountingAgent::new(false)),
            Arc::new(FailingSink),
            Arc::new(AlarmEvaluator::new(&cfg)),
            Arc::new(IrrigationController::new()),
            cache.clone(),
            DecisionPolicy::new(cfg.thresholds, cfg.confidence_floor),
            cfg.default_city.clone(),
            cfg.sensor_ids.clone(),
            cfg.irrigation_duration_minutes,
        );
        for _ in 0..4 {
            cache.push_reading(reading(18.0)).await;
        }
        cache.set_weather(snapshot("晴")).await;

        let response = router.route("启动灌溉").await;
        // The append failed, but the caller still gets the full decision.
        let decision = response.decision.expect("decision survives the log failure");
        assert_eq!(decision.action, IrrigationAction::Start);
        assert!(response.text.contains("Irrigation started"));
    }

    #[tokio::test]
    async fn slotted_sensor_scopes_the_decision_history() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        for _ in 0..4 {
            f.cache.push_reading(reading_for("sensor_001", 18.0)).await;
        }
        f.cache.set_weather(snapshot("晴")).await;

        // sensor_002 has no readings, so its scoped window is empty.
        let response = f.router.route("浇水 sensor_002").await;
        let decision = response.decision.unwrap();
        assert_eq!(decision.action, IrrigationAction::Hold);
        assert!(decision.reason.contains("insufficient history"));

        let response = f.router.route("浇水 sensor_001").await;
        assert_eq!(response.decision.unwrap().action, IrrigationAction::Start);
    }

    #[tokio::test]
    async fn slotted_sensor_scopes_the_status_report() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        f.cache.push_reading(reading_for("sensor_001", 42.0)).await;
        f.cache.push_reading(reading_for("sensor_002", 77.0)).await;

        let response = f.router.route("sensor_001 状态").await;
        assert!(response.text.contains("sensor_001"));
        assert!(response.text.contains("42.0%"));

        // Unscoped status reports the newest reading overall.
        let response = f.router.route("查看状态").await;
        assert!(response.text.contains("77.0%"));
    }

    #[tokio::test]
    async fn status_query_reports_device_and_cache_state() {
        let f = fixture(Arc::new(StaticWeather(snapshot("晴"))), false, false);
        let response = f.router.route("查看状态").await;
        assert!(response.text.contains("stopped"));
        assert!(response.text.contains("No sensor readings"));

        f.cache.push_reading(reading(42.0)).await;
        let response = f.router.route("查看状态").await;
        assert!(response.text.contains("42.0%"));
    }
}
