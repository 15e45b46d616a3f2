//! Sensor telemetry - lock-free diagnostic counters

pub mod sensor_stats;

pub use sensor_stats::{SensorStatistics, SensorStatsSnapshot};
