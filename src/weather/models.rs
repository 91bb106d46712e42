use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AMap wire types
// ---------------------------------------------------------------------------
// The provider returns every numeric field as a string; parsing into typed
// values happens in the client so malformed payloads surface as
// `WeatherUnavailable` instead of leaking provider quirks downstream.

#[derive(Debug, Deserialize)]
pub struct LiveResponse {
    pub status: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub lives: Vec<LiveEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LiveEntry {
    pub province: String,
    pub city: String,
    pub adcode: String,
    pub weather: String,
    pub temperature: String,
    pub winddirection: String,
    pub windpower: String,
    pub humidity: String,
    pub reporttime: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub status: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub forecasts: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub city: String,
    pub adcode: String,
    pub reporttime: String,
    #[serde(default)]
    pub casts: Vec<Cast>,
}

#[derive(Debug, Deserialize)]
pub struct Cast {
    pub date: String,
    pub dayweather: String,
    pub nightweather: String,
    pub daytemp: String,
    pub nighttemp: String,
}

// ---------------------------------------------------------------------------
// Domain snapshot
// ---------------------------------------------------------------------------

/// Current conditions plus a short-horizon forecast for one city.
///
/// Fetched fresh per query; never cached across calls. The forecast is in the
/// chronological order the provider returned it and is never empty for a
/// snapshot produced by the client; an empty forecast payload fails the
/// lookup instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub adcode: String,
    pub report_time: String,
    pub live: LiveConditions,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConditions {
    /// Degrees Celsius
    pub temperature: f64,
    /// Provider condition string, e.g. "晴" or "小雨"
    pub condition: String,
    /// Relative humidity percentage
    pub humidity: f64,
    pub wind_direction: String,
    pub wind_power: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub day_condition: String,
    pub night_condition: String,
    pub day_temp: f64,
    pub night_temp: f64,
}

impl WeatherSnapshot {
    /// True when the immediate horizon (the first forecast day) shows rain.
    /// AMap condition strings contain "雨" for every rain class (小雨, 雷阵雨, …).
    pub fn rain_expected(&self) -> bool {
        self.forecast
            .first()
            .map(|day| day.day_condition.contains('雨') || day.night_condition.contains('雨'))
            .unwrap_or(false)
    }

    /// Multi-line rendering used for the WEATHER intent response text.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("{} current conditions ({})", self.city, self.report_time),
            format!(
                "  {} {:.0}°C, humidity {:.0}%, wind {} {}",
                self.live.condition,
                self.live.temperature,
                self.live.humidity,
                self.live.wind_direction,
                self.live.wind_power,
            ),
        ];
        if !self.forecast.is_empty() {
            lines.push(format!("Forecast ({} days):", self.forecast.len()));
            for day in &self.forecast {
                lines.push(format!(
                    "  {}: day {} {:.0}°C / night {} {:.0}°C",
                    day.date, day.day_condition, day.day_temp, day.night_condition, day.night_temp,
                ));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(day: &str, night: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city: "朝阳区".to_owned(),
            adcode: "110105".to_owned(),
            report_time: "2023-05-18 10:28:14".to_owned(),
            live: LiveConditions {
                temperature: 26.0,
                condition: "晴".to_owned(),
                humidity: 46.0,
                wind_direction: "西南".to_owned(),
                wind_power: "≤3".to_owned(),
            },
            forecast: vec![
                ForecastDay {
                    date: "2023-05-18".to_owned(),
                    day_condition: day.to_owned(),
                    night_condition: night.to_owned(),
                    day_temp: 30.0,
                    night_temp: 18.0,
                },
                ForecastDay {
                    date: "2023-05-19".to_owned(),
                    day_condition: "雷阵雨".to_owned(),
                    night_condition: "多云".to_owned(),
                    day_temp: 27.0,
                    night_temp: 17.0,
                },
            ],
        }
    }

    #[test]
    fn rain_detection_only_looks_at_the_first_day() {
        // Second forecast day has rain either way; only the first counts.
        assert!(!snapshot("晴", "多云").rain_expected());
        assert!(snapshot("小雨", "多云").rain_expected());
        assert!(snapshot("晴", "中雨").rain_expected());
    }

    #[test]
    fn summary_includes_live_and_forecast() {
        let s = snapshot("晴", "多云");
        let text = s.summary();
        assert!(text.contains("朝阳区"));
        assert!(text.contains("晴"));
        assert!(text.contains("2023-05-19"));
    }

    #[test]
    fn wire_types_deserialize_provider_payload() {
        let body = r#"{
            "status": "1",
            "info": "OK",
            "lives": [{
                "province": "北京",
                "city": "朝阳区",
                "adcode": "110105",
                "weather": "晴",
                "temperature": "26",
                "winddirection": "西南",
                "windpower": "≤3",
                "humidity": "46",
                "reporttime": "2023-05-18 10:28:14"
            }]
        }"#;
        let parsed: LiveResponse = serde_json::from_str(body).expect("valid payload");
        assert_eq!(parsed.status, "1");
        assert_eq!(parsed.lives[0].temperature, "26");
    }
}
