//! Metrics collector implementation.
//!
//! Collects and stores check metrics for the stream monitor. Lock-free:
//! aggregate counters are plain atomics, per-stream series live in `DashMap`s.
//! A single collector instance is injected into the scheduler at construction
//! and shared with the exporter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Metrics collector for the stream monitor.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    // Aggregate check metrics
    checks_total: AtomicU64,
    check_failures_total: AtomicU64,

    // Per-stream series
    stream_status: DashMap<String, AtomicU64>,
    check_success_by_stream: DashMap<String, AtomicU64>,
    check_failed_by_stream: DashMap<String, DashMap<String, AtomicU64>>,
    response_time_last_ms: DashMap<String, AtomicU64>,
    response_time_total_ms: DashMap<String, AtomicU64>,
    response_time_count: DashMap<String, AtomicU64>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful check: health gauge to 1, success counter, latency.
    pub fn record_success(&self, stream_id: &str, response_time_ms: u64) {
        self.checks_total.fetch_add(1, Ordering::Relaxed);
        self.set_status(stream_id, true);
        self.check_success_by_stream
            .entry(stream_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        self.observe_response_time(stream_id, response_time_ms);
    }

    /// Record a failed check: health gauge to 0, failure counter by reason,
    /// latency of the failed attempt.
    pub fn record_failure(&self, stream_id: &str, reason: &str, response_time_ms: u64) {
        self.checks_total.fetch_add(1, Ordering::Relaxed);
        self.check_failures_total.fetch_add(1, Ordering::Relaxed);
        self.set_status(stream_id, false);
        self.check_failed_by_stream
            .entry(stream_id.to_string())
            .or_default()
            .entry(reason.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        self.observe_response_time(stream_id, response_time_ms);
    }

    /// Current health gauge value for one stream, if ever recorded.
    pub fn stream_status(&self, stream_id: &str) -> Option<u64> {
        self.stream_status
            .get(stream_id)
            .map(|v| v.load(Ordering::Relaxed))
    }

    /// Total checks recorded across all streams.
    pub fn checks_total(&self) -> u64 {
        self.checks_total.load(Ordering::Relaxed)
    }

    fn set_status(&self, stream_id: &str, healthy: bool) {
        self.stream_status
            .entry(stream_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(u64::from(healthy), Ordering::Relaxed);
    }

    fn observe_response_time(&self, stream_id: &str, response_time_ms: u64) {
        self.response_time_last_ms
            .entry(stream_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(response_time_ms, Ordering::Relaxed);
        self.response_time_total_ms
            .entry(stream_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(response_time_ms, Ordering::Relaxed);
        self.response_time_count
            .entry(stream_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_total: self.checks_total.load(Ordering::Relaxed),
            check_failures_total: self.check_failures_total.load(Ordering::Relaxed),
            stream_status: self
                .stream_status
                .iter()
                .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
                .collect(),
            check_success_by_stream: self
                .check_success_by_stream
                .iter()
                .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
                .collect(),
            check_failed_by_stream: self
                .check_failed_by_stream
                .iter()
                .map(|outer| {
                    let by_reason = outer
                        .value()
                        .iter()
                        .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
                        .collect();
                    (outer.key().clone(), by_reason)
                })
                .collect(),
            response_time_last_ms: self
                .response_time_last_ms
                .iter()
                .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
                .collect(),
            response_time_avg_ms: self
                .response_time_count
                .iter()
                .map(|e| {
                    let count = e.value().load(Ordering::Relaxed);
                    let total = self
                        .response_time_total_ms
                        .get(e.key())
                        .map(|v| v.load(Ordering::Relaxed))
                        .unwrap_or(0);
                    let avg = if count == 0 {
                        0.0
                    } else {
                        total as f64 / count as f64
                    };
                    (e.key().clone(), avg)
                })
                .collect(),
        }
    }
}

/// Point-in-time view of all collected metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub checks_total: u64,
    pub check_failures_total: u64,
    /// Current health per stream: 1 healthy, 0 unhealthy.
    pub stream_status: HashMap<String, u64>,
    pub check_success_by_stream: HashMap<String, u64>,
    /// Failure counts per stream, split by failure reason label.
    pub check_failed_by_stream: HashMap<String, HashMap<String, u64>>,
    pub response_time_last_ms: HashMap<String, u64>,
    pub response_time_avg_ms: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_success() {
        let collector = MetricsCollector::new();

        collector.record_success("cam1", 50);
        collector.record_success("cam1", 150);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.checks_total, 2);
        assert_eq!(snapshot.check_failures_total, 0);
        assert_eq!(snapshot.stream_status["cam1"], 1);
        assert_eq!(snapshot.check_success_by_stream["cam1"], 2);
        assert_eq!(snapshot.response_time_last_ms["cam1"], 150);
        assert!((snapshot.response_time_avg_ms["cam1"] - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_failure_by_reason() {
        let collector = MetricsCollector::new();

        collector.record_failure("cam1", "timeout", 5000);
        collector.record_failure("cam1", "timeout", 5000);
        collector.record_failure("cam1", "http_503", 20);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.checks_total, 3);
        assert_eq!(snapshot.check_failures_total, 3);
        assert_eq!(snapshot.stream_status["cam1"], 0);
        assert_eq!(snapshot.check_failed_by_stream["cam1"]["timeout"], 2);
        assert_eq!(snapshot.check_failed_by_stream["cam1"]["http_503"], 1);
    }

    #[test]
    fn test_status_gauge_flips_with_outcomes() {
        let collector = MetricsCollector::new();

        collector.record_failure("cam1", "connection_error", 0);
        assert_eq!(collector.stream_status("cam1"), Some(0));

        collector.record_success("cam1", 10);
        assert_eq!(collector.stream_status("cam1"), Some(1));

        assert_eq!(collector.stream_status("never-checked"), None);
    }

    #[test]
    fn test_streams_tracked_independently() {
        let collector = MetricsCollector::new();

        collector.record_success("cam1", 10);
        collector.record_failure("cam2", "timeout", 5000);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.stream_status["cam1"], 1);
        assert_eq!(snapshot.stream_status["cam2"], 0);
        assert!(!snapshot.check_failed_by_stream.contains_key("cam1"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let collector = MetricsCollector::new();
        collector.record_failure("cam1", "http_404", 12);

        let json = serde_json::to_string(&collector.snapshot()).unwrap();
        assert!(json.contains("http_404"));
        assert!(json.contains("check_failures_total"));
    }
}
