pub mod service;

pub use service::{DeviceState, DeviceStatus, IrrigationController};
