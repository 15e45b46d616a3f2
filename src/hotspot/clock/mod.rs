//! Logical clock driving window boundaries

pub mod watch;
pub mod window_id;

pub use watch::{ManualWatch, Watch, WindowClock};
pub use window_id::WindowId;
