use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::alarm::AlarmEvent;
use crate::db::models::{AlarmRow, DecisionRow};
use crate::error::IrrigationError;
use crate::policy::IrrigationDecision;

/// Append-only audit record of decisions and alarms.
///
/// A write failure surfaces as `LogWrite` but must never roll back the
/// decision or alarm it records; callers report the failure and keep the
/// in-memory result.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append_decision(&self, decision: &IrrigationDecision) -> Result<(), IrrigationError>;
    async fn append_alarm(&self, alarm: &AlarmEvent) -> Result<(), IrrigationError>;
}

#[derive(Debug, Clone)]
pub struct PgLogSink {
    pool: PgPool,
}

impl PgLogSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogSink for PgLogSink {
    async fn append_decision(&self, decision: &IrrigationDecision) -> Result<(), IrrigationError> {
        sqlx::query(
            r#"
            INSERT INTO irrigation_decisions (id, action, reason, triggered_by, decided_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(decision.action.as_str())
        .bind(&decision.reason)
        .bind(decision.triggered_by.as_str())
        .bind(decision.decided_at)
        .execute(&self.pool)
        .await
        .map_err(IrrigationError::LogWrite)?;
        Ok(())
    }

    async fn append_alarm(&self, alarm: &AlarmEvent) -> Result<(), IrrigationError> {
        sqlx::query(
            r#"
            INSERT INTO alarm_events (id, severity, metric, observed_value, threshold, raised_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(alarm.severity.as_str())
        .bind(&alarm.metric)
        .bind(alarm.observed_value)
        .bind(alarm.threshold)
        .bind(alarm.raised_at)
        .execute(&self.pool)
        .await
        .map_err(IrrigationError::LogWrite)?;
        Ok(())
    }
}

/// Most recent decisions, newest first.
pub async fn recent_decisions(pool: &PgPool, limit: i64) -> Result<Vec<DecisionRow>, sqlx::Error> {
    sqlx::query_as::<_, DecisionRow>(
        r#"
        SELECT id, action, reason, triggered_by, decided_at
        FROM irrigation_decisions
        ORDER BY decided_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Most recent alarm events, newest first.
pub async fn recent_alarms(pool: &PgPool, limit: i64) -> Result<Vec<AlarmRow>, sqlx::Error> {
    sqlx::query_as::<_, AlarmRow>(
        r#"
        SELECT id, severity, metric, observed_value, threshold, raised_at
        FROM alarm_events
        ORDER BY raised_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
