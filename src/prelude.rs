//! Hotspot sensor prelude - convenient imports for users

// Re-export the public API
pub use crate::sensor::{HotspotSensor, HotspotSensorBuilder};

// Configuration
pub use crate::hotspot::config::{L2Strategy, SensorConfig};

// Contracts and error types
pub use crate::hotspot::traits::{
    Element, Entry, Notification, NotificationHandler, RecoveryHint, SensorError, SensorResult,
};

// Clocks, collectors and exporters for hosts that drive the pipeline directly
pub use crate::hotspot::clock::{ManualWatch, WindowClock, WindowId};
pub use crate::hotspot::collector::{Collector, CollectorId};
pub use crate::hotspot::export::LatestNotification;
pub use crate::telemetry::sensor_stats::SensorStatsSnapshot;
