pub mod service;

pub use service::{ReadingSource, SensorService, SimulatedSensors};
