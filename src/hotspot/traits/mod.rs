//! Sensor traits and shared value types
//!
//! Element bounds, entries, the notification contract and the error enum.

pub mod core;
pub mod types_and_enums;

pub use core::{Element, Entry, Notification, NotificationHandler};
pub use types_and_enums::{RecoveryHint, SensorError, SensorResult};
