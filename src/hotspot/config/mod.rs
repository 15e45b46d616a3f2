//! Sensor configuration with validated defaults

pub mod types;

pub use types::{L2Strategy, SensorConfig};
