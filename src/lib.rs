//! Hotspot Sensor - bounded-memory hot element detection
//!
//! Tracks which elements (typically cache keys) are accessed far more often
//! than others across many concurrent producer threads, and notifies
//! registered handlers with the current hot set as time windows roll over.
//!
//! # Features
//!
//! - **Two-tier local promotion**: an element is only counted after its second
//!   sighting inside a producer's window, filtering out the long tail
//! - **Lock-free hot path**: producers never block and share no mutable state
//! - **Sliding horizon**: a ring of logical time windows with decay on gaps
//! - **Pluggable tier-2 counters**: hash map or open-addressing table
//! - **Management snapshot**: the latest notification is always readable
//!
//! ```no_run
//! use hotspot_sensor::prelude::*;
//!
//! let sensor = HotspotSensor::<String>::builder()
//!     .hot_threshold(100)
//!     .add_notification_handler(|n: &Notification<String>| {
//!         if n.element_set_changed() {
//!             println!("hot keys: {:?}", n.hot_elements());
//!         }
//!     })
//!     .build()?;
//!
//! sensor.increase("user:42".to_string());
//! # Ok::<(), SensorError>(())
//! ```

pub mod hotspot;
pub mod prelude;
pub mod sensor;
pub mod telemetry;

pub use hotspot::config::{L2Strategy, SensorConfig};
pub use hotspot::traits::{Element, Entry, Notification, NotificationHandler, SensorError, SensorResult};
pub use sensor::{HotspotSensor, HotspotSensorBuilder};
