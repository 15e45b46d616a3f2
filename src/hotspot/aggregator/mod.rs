//! Global aggregation: window state, ring, hot-set detection and the
//! consumer thread

pub mod engine;
pub mod ring;
pub mod window;
pub mod worker;

pub use engine::{Aggregator, ProcessOutcome};
pub use ring::WindowRing;
pub use window::{GlobalWindow, WindowCounter};
pub use worker::CONSUMER_THREAD_NAME;
