//! Stream probing and sweep scheduling.

pub mod prober;
pub mod scheduler;

pub use prober::Prober;
pub use scheduler::{MonitorState, StreamMonitor};
