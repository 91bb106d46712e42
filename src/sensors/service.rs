use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::models::SensorReading;
use crate::reading_cache::ReadingCache;

/// Supplies one soil/environment reading on demand. Production deployments
/// replace the simulation with a real sensor proxy behind the same trait.
pub trait ReadingSource: Send + Sync {
    fn sample(&self) -> SensorReading;
}

/// Random-but-plausible readings across a fixed set of sensor IDs.
#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    sensor_ids: Vec<String>,
}

impl SimulatedSensors {
    pub fn new(sensor_ids: Vec<String>) -> Self {
        let sensor_ids = if sensor_ids.is_empty() {
            vec!["sensor_001".to_owned()]
        } else {
            sensor_ids
        };
        Self { sensor_ids }
    }
}

impl ReadingSource for SimulatedSensors {
    fn sample(&self) -> SensorReading {
        let mut rng = rand::rng();
        let sensor_id = self.sensor_ids[rng.random_range(0..self.sensor_ids.len())].clone();
        SensorReading {
            id: Uuid::new_v4(),
            sensor_id,
            recorded_at: Utc::now(),
            soil_moisture: round2(rng.random_range(10.0..90.0)),
            temperature: round2(rng.random_range(5.0..35.0)),
            light: round2(rng.random_range(100.0..900.0)),
            rainfall: round2(rng.random_range(0.0..5.0)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Samples the reading source, persists the reading, and refreshes the shared
/// cache. Driven by the polling task in `main`.
pub struct SensorService {
    pool: PgPool,
    source: Arc<dyn ReadingSource>,
    cache: ReadingCache,
}

impl SensorService {
    pub fn new(pool: PgPool, source: Arc<dyn ReadingSource>, cache: ReadingCache) -> Self {
        Self {
            pool,
            source,
            cache,
        }
    }

    pub async fn collect_and_store(&self) -> Result<SensorReading> {
        let reading = self.source.sample();

        sqlx::query(
            r#"
            INSERT INTO sensor_readings
                (id, sensor_id, recorded_at, soil_moisture, temperature, light, rainfall)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reading.id)
        .bind(&reading.sensor_id)
        .bind(reading.recorded_at)
        .bind(reading.soil_moisture)
        .bind(reading.temperature)
        .bind(reading.light)
        .bind(reading.rainfall)
        .execute(&self.pool)
        .await?;

        self.cache.push_reading(reading.clone()).await;

        info!(
            sensor_id = %reading.sensor_id,
            soil_moisture = reading.soil_moisture,
            "Sensor reading persisted and cache updated"
        );
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_readings_stay_in_plausible_ranges() {
        let sensors = SimulatedSensors::new(vec!["sensor_001".to_owned(), "sensor_002".to_owned()]);
        for _ in 0..50 {
            let reading = sensors.sample();
            assert!((10.0..=90.0).contains(&reading.soil_moisture));
            assert!((5.0..=35.0).contains(&reading.temperature));
            assert!((100.0..=900.0).contains(&reading.light));
            assert!((0.0..=5.0).contains(&reading.rainfall));
            assert!(reading.sensor_id.starts_with("sensor_"));
        }
    }

    #[test]
    fn empty_sensor_list_falls_back_to_a_default_id() {
        let sensors = SimulatedSensors::new(Vec::new());
        assert_eq!(sensors.sample().sensor_id, "sensor_001");
    }
}
