use anyhow::{Context, Result};

use crate::policy::Thresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Upper bound on the Postgres connection pool.
    pub db_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// AMap weather API key; an empty key makes every lookup fail fast.
    pub amap_api_key: String,
    pub amap_base_url: String,
    /// City used when an utterance names no city.
    pub default_city: String,
    /// OpenAI-compatible endpoint for delegated free-text commands.
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    /// Upper bound on every outbound weather / LLM call.
    pub http_timeout_secs: u64,
    /// Soil-moisture thresholds driving the decision policy. Validated at
    /// construction; the service refuses to start on low >= high.
    pub thresholds: Thresholds,
    /// Minimum prediction confidence before the policy acts on it.
    pub confidence_floor: f64,
    /// Soil-moisture percentage below which alarms fire.
    pub alarm_moisture_threshold: f64,
    /// Air temperature (degrees Celsius) above which alarms fire.
    pub alarm_temp_high: f64,
    pub alarm_enabled: bool,
    /// Comma-separated list of simulated sensor IDs to poll
    pub sensor_ids: Vec<String>,
    /// Sensor polling interval in seconds
    pub poll_interval_secs: u64,
    /// Automated irrigation check interval in seconds
    pub check_interval_secs: u64,
    /// Number of recent readings kept for the predictor
    pub history_window: usize,
    /// Default irrigation run length once started
    pub irrigation_duration_minutes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let low: f64 = optional("MOISTURE_THRESHOLD_LOW", "20")
            .parse()
            .context("MOISTURE_THRESHOLD_LOW must be a number")?;
        let high: f64 = optional("MOISTURE_THRESHOLD_HIGH", "80")
            .parse()
            .context("MOISTURE_THRESHOLD_HIGH must be a number")?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            amap_api_key: optional("AMAP_API_KEY", ""),
            amap_base_url: optional("AMAP_BASE_URL", "https://restapi.amap.com"),
            default_city: optional("DEFAULT_CITY", "北京"),
            llm_api_key: optional("LLM_API_KEY", ""),
            llm_base_url: optional("LLM_BASE_URL", "https://api.openai.com/v1"),
            llm_model: optional("LLM_MODEL", "gpt-4o"),
            http_timeout_secs: optional("HTTP_TIMEOUT_SECS", "10")
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a positive integer")?,
            thresholds: Thresholds::new(low, high)?,
            confidence_floor: optional("CONFIDENCE_FLOOR", "0.3")
                .parse()
                .context("CONFIDENCE_FLOOR must be a number")?,
            alarm_moisture_threshold: optional("ALARM_MOISTURE_THRESHOLD", "25")
                .parse()
                .context("ALARM_MOISTURE_THRESHOLD must be a number")?,
            alarm_temp_high: optional("ALARM_TEMP_HIGH", "45")
                .parse()
                .context("ALARM_TEMP_HIGH must be a number")?,
            alarm_enabled: optional("ALARM_ENABLED", "true")
                .parse()
                .context("ALARM_ENABLED must be true or false")?,
            sensor_ids: optional("SENSOR_IDS", "sensor_001,sensor_002")
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.trim().to_owned())
                .collect(),
            poll_interval_secs: optional("POLL_INTERVAL_SECS", "300")
                .parse()
                .context("POLL_INTERVAL_SECS must be a positive integer")?,
            check_interval_secs: optional("CHECK_INTERVAL_SECS", "300")
                .parse()
                .context("CHECK_INTERVAL_SECS must be a positive integer")?,
            history_window: optional("HISTORY_WINDOW", "12")
                .parse()
                .context("HISTORY_WINDOW must be a positive integer")?,
            irrigation_duration_minutes: optional("IRRIGATION_DURATION_MINUTES", "30")
                .parse()
                .context("IRRIGATION_DURATION_MINUTES must be a positive integer")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
