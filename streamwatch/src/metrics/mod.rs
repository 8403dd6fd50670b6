//! Metrics collection and exposition.
//!
//! A single [`MetricsCollector`] instance is injected into the scheduler and
//! updated once per applied probe outcome:
//!
//! - per-stream health gauge (1 healthy / 0 unhealthy)
//! - success counter by stream id
//! - failure counter by (stream id, failure reason)
//! - last and average probe duration by stream id
//!
//! [`PrometheusExporter`] renders the collector in text exposition format and
//! [`MetricsServer`] serves it on a dedicated listener.

mod collector;
mod prometheus;
mod server;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use prometheus::PrometheusExporter;
pub use server::MetricsServer;
