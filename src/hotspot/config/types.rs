//! Sensor configuration types
//!
//! Defaults describe a one second detection horizon: 20 windows of 50 ms.

use serde::{Deserialize, Serialize};

use crate::hotspot::tier::l2::OpenAddressingL2Counter;
use crate::hotspot::traits::{SensorError, SensorResult};

pub const DEFAULT_CHANNEL_SIZE: usize = 4096;
pub const DEFAULT_WINDOWS_NUMBER: usize = 20;
pub const DEFAULT_WINDOW_SIZE_MILLIS: u64 = 50;
pub const DEFAULT_L1_CAPACITY: usize = 200;
pub const DEFAULT_L2_CAPACITY: usize = 200;
pub const DEFAULT_HOT_THRESHOLD: u64 = 100;
pub const DEFAULT_TICK_INTERVAL_MILLIS: u64 = 1;

/// Tier-2 counter strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum L2Strategy {
    /// Hash map backed counter
    #[default]
    Simple,
    /// Array-backed double hashing table
    OpenAddressing,
}

/// Sensor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Capacity of the hand-off channel between collectors and the aggregator
    pub channel_size: usize,
    /// Number of ring slots; horizon is `windows_number * window_size_millis`
    pub windows_number: usize,
    /// Logical window granularity
    pub window_size_millis: u64,
    /// Per-collector tier-1 recency buffer size
    pub l1_capacity: usize,
    /// Per-collector tier-2 exact counter size
    pub l2_capacity: usize,
    /// Inclusive minimum aggregate count for an element to be hot
    pub hot_threshold: u64,
    pub l2_strategy: L2Strategy,
    /// Refresh period of the ticking watch
    pub tick_interval_millis: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channel_size: DEFAULT_CHANNEL_SIZE,
            windows_number: DEFAULT_WINDOWS_NUMBER,
            window_size_millis: DEFAULT_WINDOW_SIZE_MILLIS,
            l1_capacity: DEFAULT_L1_CAPACITY,
            l2_capacity: DEFAULT_L2_CAPACITY,
            hot_threshold: DEFAULT_HOT_THRESHOLD,
            l2_strategy: L2Strategy::default(),
            tick_interval_millis: DEFAULT_TICK_INTERVAL_MILLIS,
        }
    }
}

impl SensorConfig {
    /// Reject non-positive sizes and out-of-range table sizing
    pub fn validate(&self) -> SensorResult<()> {
        let positive = [
            ("channel_size", self.channel_size as u64),
            ("windows_number", self.windows_number as u64),
            ("window_size_millis", self.window_size_millis),
            ("l1_capacity", self.l1_capacity as u64),
            ("l2_capacity", self.l2_capacity as u64),
            ("hot_threshold", self.hot_threshold),
            ("tick_interval_millis", self.tick_interval_millis),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SensorError::invalid_configuration(format!(
                    "{} must be positive",
                    name
                )));
            }
        }

        if self.l2_strategy == L2Strategy::OpenAddressing {
            OpenAddressingL2Counter::<u8>::table_size_for(self.l2_capacity).map_err(|_| {
                SensorError::invalid_configuration(format!(
                    "l2_capacity {} exceeds the open-addressing table range",
                    self.l2_capacity
                ))
            })?;
        }

        if self.tick_interval_millis > self.window_size_millis {
            log::warn!(
                "tick interval {} ms exceeds window size {} ms, windows will be skipped",
                self.tick_interval_millis,
                self.window_size_millis
            );
        }

        Ok(())
    }

    /// Detection horizon in milliseconds
    pub fn horizon_millis(&self) -> u64 {
        self.windows_number as u64 * self.window_size_millis
    }

    /// Load from a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> SensorResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SensorError::invalid_configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SensorResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SensorError::invalid_configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SensorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon_millis(), 1000);
        assert_eq!(config.channel_size, 4096);
        assert_eq!(config.hot_threshold, 100);
    }

    #[test]
    fn test_rejects_non_positive_sizes() {
        let cases: [fn(&mut SensorConfig); 6] = [
            |c| c.channel_size = 0,
            |c| c.windows_number = 0,
            |c| c.window_size_millis = 0,
            |c| c.l1_capacity = 0,
            |c| c.l2_capacity = 0,
            |c| c.hot_threshold = 0,
        ];
        for mutate in cases {
            let mut config = SensorConfig::default();
            mutate(&mut config);
            assert!(matches!(
                config.validate(),
                Err(SensorError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_oversized_open_addressing() {
        let config = SensorConfig {
            l2_strategy: L2Strategy::OpenAddressing,
            l2_capacity: usize::MAX / 4,
            ..SensorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let config = SensorConfig::from_json(r#"{"windows_number": 3, "l2_strategy": "open_addressing"}"#)
            .unwrap();
        assert_eq!(config.windows_number, 3);
        assert_eq!(config.l2_strategy, L2Strategy::OpenAddressing);
        assert_eq!(config.l1_capacity, DEFAULT_L1_CAPACITY);

        let json = config.to_json().unwrap();
        assert_eq!(SensorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_validates() {
        assert!(SensorConfig::from_json(r#"{"hot_threshold": 0}"#).is_err());
    }
}
