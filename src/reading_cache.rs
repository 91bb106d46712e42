use std::{collections::VecDeque, sync::Arc};

use tokio::sync::RwLock;

use crate::db::models::SensorReading;
use crate::weather::models::WeatherSnapshot;

/// In-memory store of the bounded recent-reading window plus the most recent
/// weather snapshot.
///
/// This is the only mutable state shared between the router, the sensor poll
/// task, and the automated irrigation check. Wrapped in `Arc` so it can be
/// cheaply cloned across tasks; the `RwLock` enforces single-writer-at-a-time,
/// and every write overwrites (never merges) — last write wins.
#[derive(Clone)]
pub struct ReadingCache {
    inner: Arc<RwLock<CacheState>>,
    capacity: usize,
}

#[derive(Default)]
struct CacheState {
    readings: VecDeque<SensorReading>,
    weather: Option<WeatherSnapshot>,
}

impl ReadingCache {
    /// `capacity` bounds the reading window; the oldest reading is dropped
    /// once it is full.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheState::default())),
            capacity: capacity.max(1),
        }
    }

    /// Append a reading, evicting the oldest one when the window is full.
    pub async fn push_reading(&self, reading: SensorReading) {
        let mut state = self.inner.write().await;
        if state.readings.len() == self.capacity {
            state.readings.pop_front();
        }
        state.readings.push_back(reading);
    }

    /// Most recent reading, if any sample has been taken.
    pub async fn latest_reading(&self) -> Option<SensorReading> {
        self.inner.read().await.readings.back().cloned()
    }

    /// Snapshot of the reading window, oldest first.
    pub async fn history(&self) -> Vec<SensorReading> {
        self.inner.read().await.readings.iter().cloned().collect()
    }

    /// Replace the cached weather snapshot.
    pub async fn set_weather(&self, snapshot: WeatherSnapshot) {
        self.inner.write().await.weather = Some(snapshot);
    }

    pub async fn latest_weather(&self) -> Option<WeatherSnapshot> {
        self.inner.read().await.weather.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn reading(moisture: f64) -> SensorReading {
        SensorReading {
            id: Uuid::new_v4(),
            sensor_id: "sensor_001".to_owned(),
            recorded_at: Utc::now(),
            soil_moisture: moisture,
            temperature: 22.0,
            light: 450.0,
            rainfall: 0.0,
        }
    }

    #[tokio::test]
    async fn window_is_bounded_and_ordered() {
        let cache = ReadingCache::new(3);
        for m in [10.0, 20.0, 30.0, 40.0] {
            cache.push_reading(reading(m)).await;
        }

        let history = cache.history().await;
        let moistures: Vec<f64> = history.iter().map(|r| r.soil_moisture).collect();
        assert_eq!(moistures, vec![20.0, 30.0, 40.0]);
        assert_eq!(cache.latest_reading().await.unwrap().soil_moisture, 40.0);
    }

    #[tokio::test]
    async fn empty_cache_has_no_latest() {
        let cache = ReadingCache::new(4);
        assert!(cache.latest_reading().await.is_none());
        assert!(cache.latest_weather().await.is_none());
        assert!(cache.history().await.is_empty());
    }
}
