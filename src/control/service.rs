use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

/// Simulated device state. There is no hardware interface behind this; "start"
/// flips a flag and stamps the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub state: DeviceState,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_minutes: Option<f64>,
    pub remaining_minutes: Option<f64>,
    pub duration_minutes: Option<u64>,
}

/// Simulated irrigation device. Start/stop are idempotent: repeating the
/// current state returns `false` and changes nothing.
#[derive(Debug)]
pub struct IrrigationController {
    inner: RwLock<ControllerState>,
}

#[derive(Debug)]
struct ControllerState {
    state: DeviceState,
    started_at: Option<DateTime<Utc>>,
    duration_minutes: u64,
}

impl IrrigationController {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ControllerState {
                state: DeviceState::Stopped,
                started_at: None,
                duration_minutes: 0,
            }),
        }
    }

    /// Returns `false` if irrigation was already running.
    pub async fn start(&self, duration_minutes: u64) -> bool {
        let mut state = self.inner.write().await;
        if state.state == DeviceState::Running {
            return false;
        }
        state.state = DeviceState::Running;
        state.started_at = Some(Utc::now());
        state.duration_minutes = duration_minutes;
        info!(duration_minutes, "Irrigation started");
        true
    }

    /// Returns `false` if irrigation was already stopped.
    pub async fn stop(&self) -> bool {
        let mut state = self.inner.write().await;
        if state.state == DeviceState::Stopped {
            return false;
        }
        state.state = DeviceState::Stopped;
        state.started_at = None;
        state.duration_minutes = 0;
        info!("Irrigation stopped");
        true
    }

    pub async fn status(&self) -> DeviceStatus {
        let state = self.inner.read().await;
        match (state.state, state.started_at) {
            (DeviceState::Running, Some(started_at)) => {
                let elapsed = (Utc::now() - started_at).num_seconds() as f64 / 60.0;
                let remaining = (state.duration_minutes as f64 - elapsed).max(0.0);
                DeviceStatus {
                    state: DeviceState::Running,
                    started_at: Some(started_at),
                    elapsed_minutes: Some(elapsed),
                    remaining_minutes: Some(remaining),
                    duration_minutes: Some(state.duration_minutes),
                }
            }
            _ => DeviceStatus {
                state: DeviceState::Stopped,
                started_at: None,
                elapsed_minutes: None,
                remaining_minutes: None,
                duration_minutes: None,
            },
        }
    }
}

impl Default for IrrigationController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_and_stop_flip_state() {
        let controller = IrrigationController::new();
        assert_eq!(controller.status().await.state, DeviceState::Stopped);

        assert!(controller.start(30).await);
        let status = controller.status().await;
        assert_eq!(status.state, DeviceState::Running);
        assert!(status.started_at.is_some());
        assert_eq!(status.duration_minutes, Some(30));
        assert!(status.remaining_minutes.unwrap() <= 30.0);

        assert!(controller.stop().await);
        assert_eq!(controller.status().await.state, DeviceState::Stopped);
    }

    #[tokio::test]
    async fn repeated_transitions_are_idempotent() {
        let controller = IrrigationController::new();
        assert!(!controller.stop().await, "already stopped");

        assert!(controller.start(10).await);
        assert!(!controller.start(10).await, "already running");

        assert!(controller.stop().await);
        assert!(!controller.stop().await);
    }
}
