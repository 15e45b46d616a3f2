//! Local two-tier collectors and the per-thread registry

pub mod local;
pub mod registry;

pub use local::{Collector, CollectorFactory, CollectorId};
pub use registry::CollectorRegistry;
