pub mod models;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::IrrigationError;

use self::models::{ForecastDay, ForecastResponse, LiveConditions, LiveResponse, WeatherSnapshot};

/// Whitelisted city names and their AMap adcodes. Inputs outside this table
/// pass through only when they are already raw numeric adcodes.
pub const CITY_CODES: &[(&str, &str)] = &[
    ("北京", "110000"),
    ("上海", "310000"),
    ("广州", "440100"),
    ("深圳", "440300"),
    ("杭州", "330100"),
    ("南京", "320100"),
    ("成都", "510100"),
    ("重庆", "500000"),
    ("武汉", "420100"),
    ("西安", "610100"),
    ("天津", "120000"),
];

/// Resolve a city name or raw adcode to the provider city code.
pub fn resolve_city(input: &str) -> Result<String, IrrigationError> {
    let trimmed = input.trim();
    if let Some((_, code)) = CITY_CODES.iter().find(|(name, _)| *name == trimmed) {
        return Ok((*code).to_owned());
    }
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Ok(trimmed.to_owned());
    }
    Err(IrrigationError::UnknownCity(trimmed.to_owned()))
}

/// Scan free text for any whitelisted city name. First table entry found in
/// the text wins when several city names co-occur.
pub fn find_city_in_text(text: &str) -> Option<&'static str> {
    CITY_CODES
        .iter()
        .map(|(name, _)| *name)
        .find(|name| text.contains(name))
}

/// Capability contract for the weather provider, so the router can be tested
/// against a double without network access.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn get_weather(&self, city_or_code: &str) -> Result<WeatherSnapshot, IrrigationError>;
}

/// AMap (高德) weather client. Two GETs per snapshot: `extensions=base` for
/// live conditions, `extensions=all` for the multi-day forecast. No retry and
/// no caching; a provider error propagates immediately.
#[derive(Debug, Clone)]
pub struct AmapClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AmapClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build weather HTTP client")?;
        Ok(Self {
            http,
            base_url: config.amap_base_url.clone(),
            api_key: config.amap_api_key.clone(),
        })
    }

    async fn fetch(&self, adcode: &str, extensions: &str) -> Result<Vec<u8>, IrrigationError> {
        let url = format!("{}/v3/weather/weatherInfo", self.base_url);
        debug!(adcode = %adcode, extensions = %extensions, "Fetching weather");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("city", adcode),
                ("extensions", extensions),
            ])
            .send()
            .await
            .map_err(|e| IrrigationError::WeatherUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| IrrigationError::WeatherUnavailable(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| IrrigationError::WeatherUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl WeatherSource for AmapClient {
    async fn get_weather(&self, city_or_code: &str) -> Result<WeatherSnapshot, IrrigationError> {
        if self.api_key.is_empty() {
            return Err(IrrigationError::WeatherUnavailable(
                "weather API key not configured".to_owned(),
            ));
        }
        let adcode = resolve_city(city_or_code)?;

        let live_bytes = self.fetch(&adcode, "base").await?;
        let live: LiveResponse = serde_json::from_slice(&live_bytes)
            .map_err(|e| IrrigationError::WeatherUnavailable(format!("malformed live payload: {e}")))?;
        if live.status != "1" {
            return Err(IrrigationError::WeatherUnavailable(format!(
                "provider rejected live query: {}",
                live.info
            )));
        }
        let entry = live.lives.into_iter().next().ok_or_else(|| {
            IrrigationError::WeatherUnavailable("provider returned no live conditions".to_owned())
        })?;

        let forecast_bytes = self.fetch(&adcode, "all").await?;
        let forecast: ForecastResponse = serde_json::from_slice(&forecast_bytes).map_err(|e| {
            IrrigationError::WeatherUnavailable(format!("malformed forecast payload: {e}"))
        })?;
        let forecast_days = extract_forecast(forecast)?;

        Ok(WeatherSnapshot {
            city: entry.city,
            adcode: entry.adcode,
            report_time: entry.reporttime,
            live: LiveConditions {
                temperature: parse_metric(&entry.temperature, "temperature")?,
                condition: entry.weather,
                humidity: parse_metric(&entry.humidity, "humidity")?,
                wind_direction: entry.winddirection,
                wind_power: entry.windpower,
            },
            forecast: forecast_days,
        })
    }
}

/// A successful forecast response must carry at least one cast. An empty
/// payload would read downstream as a rain-free day, so it is treated as a
/// provider failure instead.
fn extract_forecast(response: ForecastResponse) -> Result<Vec<ForecastDay>, IrrigationError> {
    if response.status != "1" {
        return Err(IrrigationError::WeatherUnavailable(format!(
            "provider rejected forecast query: {}",
            response.info
        )));
    }
    let days = response
        .forecasts
        .into_iter()
        .next()
        .map(|f| {
            f.casts
                .into_iter()
                .map(|cast| {
                    Ok(ForecastDay {
                        day_temp: parse_metric(&cast.daytemp, "daytemp")?,
                        night_temp: parse_metric(&cast.nighttemp, "nighttemp")?,
                        date: cast.date,
                        day_condition: cast.dayweather,
                        night_condition: cast.nightweather,
                    })
                })
                .collect::<Result<Vec<_>, IrrigationError>>()
        })
        .transpose()?
        .unwrap_or_default();
    if days.is_empty() {
        return Err(IrrigationError::WeatherUnavailable(
            "provider returned an empty forecast".to_owned(),
        ));
    }
    Ok(days)
}

/// Provider numerics are strings; a malformed one is a provider failure, not
/// something to paper over with a default.
fn parse_metric(raw: &str, field: &str) -> Result<f64, IrrigationError> {
    raw.trim().parse().map_err(|_| {
        IrrigationError::WeatherUnavailable(format!("malformed {field} value: {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_city_resolves_to_its_adcode() {
        assert_eq!(resolve_city("北京").unwrap(), "110000");
        assert_eq!(resolve_city("上海").unwrap(), "310000");
        assert_eq!(resolve_city(" 深圳 ").unwrap(), "440300");
    }

    #[test]
    fn raw_adcode_passes_through() {
        assert_eq!(resolve_city("110105").unwrap(), "110105");
    }

    #[test]
    fn unknown_city_is_rejected() {
        let err = resolve_city("亚特兰蒂斯").unwrap_err();
        assert!(matches!(err, IrrigationError::UnknownCity(name) if name == "亚特兰蒂斯"));
        assert!(matches!(resolve_city(""), Err(IrrigationError::UnknownCity(_))));
        // Mixed alphanumerics are neither a known name nor a raw code.
        assert!(matches!(resolve_city("110abc"), Err(IrrigationError::UnknownCity(_))));
    }

    #[test]
    fn first_city_in_table_order_wins() {
        assert_eq!(find_city_in_text("北京天气如何"), Some("北京"));
        // Both cities present: the earlier table entry is the tie-break.
        assert_eq!(find_city_in_text("从上海去北京出差"), Some("北京"));
        assert_eq!(find_city_in_text("今天很热"), None);
    }

    fn forecast_response(forecasts: Vec<models::ForecastEntry>) -> ForecastResponse {
        ForecastResponse {
            status: "1".to_owned(),
            info: "OK".to_owned(),
            forecasts,
        }
    }

    fn forecast_entry(casts: Vec<models::Cast>) -> models::ForecastEntry {
        models::ForecastEntry {
            city: "北京".to_owned(),
            adcode: "110000".to_owned(),
            reporttime: "2023-05-18 10:00:00".to_owned(),
            casts,
        }
    }

    fn cast(date: &str, dayweather: &str) -> models::Cast {
        models::Cast {
            date: date.to_owned(),
            dayweather: dayweather.to_owned(),
            nightweather: "多云".to_owned(),
            daytemp: "30".to_owned(),
            nighttemp: "18".to_owned(),
        }
    }

    #[test]
    fn forecast_casts_convert_in_provider_order() {
        let response = forecast_response(vec![forecast_entry(vec![
            cast("2023-05-18", "晴"),
            cast("2023-05-19", "小雨"),
        ])]);
        let days = extract_forecast(response).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2023-05-18");
        assert_eq!(days[1].day_condition, "小雨");
        assert_eq!(days[0].day_temp, 30.0);
    }

    #[test]
    fn empty_forecast_is_a_provider_failure() {
        // status "1" with no forecast entries must not pass as a rain-free day.
        let err = extract_forecast(forecast_response(Vec::new())).unwrap_err();
        assert!(matches!(err, IrrigationError::WeatherUnavailable(_)));

        let err = extract_forecast(forecast_response(vec![forecast_entry(Vec::new())])).unwrap_err();
        assert!(matches!(err, IrrigationError::WeatherUnavailable(_)));
    }

    #[test]
    fn rejected_forecast_status_is_a_provider_failure() {
        let mut response = forecast_response(vec![forecast_entry(vec![cast("2023-05-18", "晴")])]);
        response.status = "0".to_owned();
        response.info = "INVALID_USER_KEY".to_owned();
        let err = extract_forecast(response).unwrap_err();
        assert!(matches!(err, IrrigationError::WeatherUnavailable(ref msg) if msg.contains("INVALID_USER_KEY")));
    }

    #[test]
    fn parse_metric_rejects_garbage() {
        assert_eq!(parse_metric("26", "temperature").unwrap(), 26.0);
        assert!(parse_metric("N/A", "temperature").is_err());
    }
}
