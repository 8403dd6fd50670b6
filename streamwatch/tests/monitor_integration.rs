//! Integration tests for the stream monitor.
//!
//! These tests run the monitor against real HTTP endpoints served on
//! ephemeral local ports, exercising sweeps, on-demand checks, shutdown
//! draining and the metrics pipeline end to end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;

use streamwatch::config::MonitorConfig;
use streamwatch::metrics::{MetricsCollector, PrometheusExporter};
use streamwatch::monitor::{MonitorState, Prober, StreamMonitor};
use streamwatch::registry::{StreamDefinition, StreamRegistry};

/// Serve stub stream endpoints on an ephemeral port.
///
/// `/ok` answers 200 immediately, `/missing` answers 404, `/slow` holds the
/// response for two seconds.
async fn spawn_stub_server() -> SocketAddr {
    let router = Router::new()
        .route("/ok", get(|| async { "stream data" }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such stream") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late stream data"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Failed to read stub address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Stub server failed");
    });
    addr
}

/// An address nothing listens on, for connection-refused cases.
async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind throwaway listener");
    let addr = listener.local_addr().expect("Failed to read address");
    drop(listener);
    addr
}

struct TestHarness {
    monitor: StreamMonitor,
    registry: Arc<StreamRegistry>,
    metrics: Arc<MetricsCollector>,
}

/// Wire a monitor with its registry and collector exposed for assertions.
fn build_monitor(
    definitions: Vec<StreamDefinition>,
    interval_secs: u64,
    timeout_secs: u64,
) -> TestHarness {
    let registry = Arc::new(StreamRegistry::new(definitions));
    let prober =
        Arc::new(Prober::new(Duration::from_secs(timeout_secs)).expect("Failed to build prober"));
    let metrics = Arc::new(MetricsCollector::new());
    let config = MonitorConfig {
        check_interval_secs: interval_secs,
        timeout_secs,
        retry_attempts: 0,
    };
    let monitor = StreamMonitor::new(
        Arc::clone(&registry),
        prober,
        Arc::clone(&metrics),
        config,
    );
    TestHarness {
        monitor,
        registry,
        metrics,
    }
}

/// Poll `condition` every 25ms until it holds or `deadline` elapses.
async fn wait_until<F>(deadline: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let started = Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}

mod sweep_tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_sweep_checks_every_stream() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![
                StreamDefinition::new("ok", "OK Stream", format!("http://{addr}/ok")),
                StreamDefinition::new("missing", "Missing Stream", format!("http://{addr}/missing")),
            ],
            3600,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");

        let registry = Arc::clone(&harness.registry);
        let swept = wait_until(Duration::from_secs(5), || {
            registry
                .snapshot_all()
                .iter()
                .all(|s| s.record.last_checked_at.is_some())
        })
        .await;
        assert!(swept, "initial sweep did not reach every stream");

        let ok = harness.registry.snapshot_one("ok").expect("ok missing");
        assert!(ok.record.healthy);
        assert_eq!(ok.record.last_message, "OK");
        assert_eq!(ok.record.consecutive_failures, 0);

        let missing = harness
            .registry
            .snapshot_one("missing")
            .expect("missing missing");
        assert!(!missing.record.healthy);
        assert_eq!(missing.record.last_message, "HTTP 404");
        assert_eq!(missing.record.consecutive_failures, 1);

        harness.monitor.stop().await.expect("Failed to stop");
    }

    #[tokio::test]
    async fn test_periodic_sweeps_accumulate_failures() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "missing",
                "Missing Stream",
                format!("http://{addr}/missing"),
            )],
            1,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");

        // Initial sweep plus at least two periodic ones.
        let registry = Arc::clone(&harness.registry);
        let repeated = wait_until(Duration::from_secs(10), || {
            registry
                .snapshot_one("missing")
                .map(|s| s.record.consecutive_failures >= 3)
                .unwrap_or(false)
        })
        .await;
        assert!(repeated, "periodic sweeps did not keep re-checking");

        let record = harness
            .registry
            .snapshot_one("missing")
            .expect("missing missing")
            .record;
        assert!(!record.healthy);
        assert_eq!(record.last_message, "HTTP 404");

        harness.monitor.stop().await.expect("Failed to stop");
    }

    #[tokio::test]
    async fn test_sweep_classifies_timeout() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "slow",
                "Slow Stream",
                format!("http://{addr}/slow"),
            )],
            3600,
            1,
        );

        harness.monitor.start().expect("Failed to start monitor");

        let registry = Arc::clone(&harness.registry);
        let checked = wait_until(Duration::from_secs(5), || {
            registry
                .snapshot_one("slow")
                .map(|s| s.record.last_checked_at.is_some())
                .unwrap_or(false)
        })
        .await;
        assert!(checked, "timeout probe never completed");

        let record = harness
            .registry
            .snapshot_one("slow")
            .expect("slow missing")
            .record;
        assert!(!record.healthy);
        assert!(record.last_message.contains("timed out"));
        // The probe waits out the full 1s timeout before giving up.
        assert!(record.response_time_ms >= 500);

        let snapshot = harness.metrics.snapshot();
        let reasons = snapshot
            .check_failed_by_stream
            .get("slow")
            .expect("no failure metrics for slow stream");
        assert_eq!(reasons.get("timeout"), Some(&1));

        harness.monitor.stop().await.expect("Failed to stop");
    }

    #[tokio::test]
    async fn test_sweep_classifies_connection_error() {
        let addr = unreachable_addr().await;
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "gone",
                "Gone Stream",
                format!("http://{addr}/ok"),
            )],
            3600,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");

        let registry = Arc::clone(&harness.registry);
        let checked = wait_until(Duration::from_secs(5), || {
            registry
                .snapshot_one("gone")
                .map(|s| s.record.last_checked_at.is_some())
                .unwrap_or(false)
        })
        .await;
        assert!(checked, "connection-refused probe never completed");

        let record = harness
            .registry
            .snapshot_one("gone")
            .expect("gone missing")
            .record;
        assert!(!record.healthy);
        assert!(record.last_message.starts_with("Connection failed"));

        let snapshot = harness.metrics.snapshot();
        let reasons = snapshot
            .check_failed_by_stream
            .get("gone")
            .expect("no failure metrics for gone stream");
        assert_eq!(reasons.get("connection_error"), Some(&1));

        harness.monitor.stop().await.expect("Failed to stop");
    }
}

mod trigger_tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_check_reprobes_stream() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "ok",
                "OK Stream",
                format!("http://{addr}/ok"),
            )],
            3600,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");

        let registry = Arc::clone(&harness.registry);
        let swept = wait_until(Duration::from_secs(5), || {
            registry
                .snapshot_one("ok")
                .map(|s| s.record.last_checked_at.is_some())
                .unwrap_or(false)
        })
        .await;
        assert!(swept, "initial sweep never completed");

        let first_checked = harness
            .registry
            .snapshot_one("ok")
            .expect("ok missing")
            .record
            .last_checked_at
            .expect("no first check timestamp");

        harness
            .monitor
            .trigger_check("ok")
            .expect("Failed to trigger check");

        let registry = Arc::clone(&harness.registry);
        let rechecked = wait_until(Duration::from_secs(5), || {
            registry
                .snapshot_one("ok")
                .and_then(|s| s.record.last_checked_at)
                .map(|t| t > first_checked)
                .unwrap_or(false)
        })
        .await;
        assert!(rechecked, "on-demand check never landed");

        // The record is applied before the counters bump; give the metrics
        // write its own deadline instead of asserting instantly.
        let metrics = Arc::clone(&harness.metrics);
        let counted = wait_until(Duration::from_secs(2), || metrics.checks_total() == 2).await;
        assert!(counted, "on-demand check was not counted");

        harness.monitor.stop().await.expect("Failed to stop");
    }

    #[tokio::test]
    async fn test_trigger_check_acknowledges_before_probe_finishes() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "slow",
                "Slow Stream",
                format!("http://{addr}/slow"),
            )],
            3600,
            10,
        );

        harness.monitor.start().expect("Failed to start monitor");

        // The stub holds responses for 2s; the ack must not wait for that.
        let started = Instant::now();
        harness
            .monitor
            .trigger_check("slow")
            .expect("Failed to trigger check");
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "trigger_check blocked on the probe"
        );

        harness.monitor.stop().await.expect("Failed to stop");
    }
}

mod shutdown_tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_cancels_in_flight_probes() {
        let addr = spawn_stub_server().await;
        // Generous timeout so only cancellation can end the probe early.
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "slow",
                "Slow Stream",
                format!("http://{addr}/slow"),
            )],
            3600,
            10,
        );

        harness.monitor.start().expect("Failed to start monitor");
        // Let the initial sweep spawn its probe against the slow endpoint.
        tokio::time::sleep(Duration::from_millis(150)).await;

        let started = Instant::now();
        harness.monitor.stop().await.expect("Failed to stop");
        let elapsed = started.elapsed();

        assert!(
            elapsed < Duration::from_millis(1500),
            "stop waited out the probe instead of cancelling it: {elapsed:?}"
        );
        assert_eq!(harness.monitor.state(), MonitorState::Stopped);

        // The cancelled probe must not have written a result.
        let record = harness
            .registry
            .snapshot_one("slow")
            .expect("slow missing")
            .record;
        assert!(record.last_checked_at.is_none());
    }

    #[tokio::test]
    async fn test_restart_probes_again() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![StreamDefinition::new(
                "ok",
                "OK Stream",
                format!("http://{addr}/ok"),
            )],
            3600,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");
        let metrics = Arc::clone(&harness.metrics);
        let first = wait_until(Duration::from_secs(5), || metrics.checks_total() >= 1).await;
        assert!(first, "initial sweep never completed");
        harness.monitor.stop().await.expect("Failed to stop");

        let before_restart = harness.metrics.checks_total();
        harness.monitor.start().expect("Failed to restart monitor");

        let metrics = Arc::clone(&harness.metrics);
        let again = wait_until(Duration::from_secs(5), || {
            metrics.checks_total() > before_restart
        })
        .await;
        assert!(again, "restarted monitor never probed");

        harness.monitor.stop().await.expect("Failed to stop");
    }
}

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_partition_streams() {
        let addr = spawn_stub_server().await;
        let dead = unreachable_addr().await;
        let harness = build_monitor(
            vec![
                StreamDefinition::new("ok", "OK Stream", format!("http://{addr}/ok")),
                StreamDefinition::new("missing", "Missing Stream", format!("http://{addr}/missing")),
                StreamDefinition::new("gone", "Gone Stream", format!("http://{dead}/ok")),
            ],
            3600,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");

        let registry = Arc::clone(&harness.registry);
        let swept = wait_until(Duration::from_secs(10), || {
            registry
                .snapshot_all()
                .iter()
                .all(|s| s.record.last_checked_at.is_some())
        })
        .await;
        assert!(swept, "initial sweep did not reach every stream");

        let stats = harness.monitor.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.healthy, 1);
        assert_eq!(stats.unhealthy, 2);

        harness.monitor.stop().await.expect("Failed to stop");
    }
}

mod metrics_tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_feeds_collector_and_exporter() {
        let addr = spawn_stub_server().await;
        let harness = build_monitor(
            vec![
                StreamDefinition::new("ok", "OK Stream", format!("http://{addr}/ok")),
                StreamDefinition::new("missing", "Missing Stream", format!("http://{addr}/missing")),
            ],
            3600,
            2,
        );

        harness.monitor.start().expect("Failed to start monitor");

        let metrics = Arc::clone(&harness.metrics);
        let swept = wait_until(Duration::from_secs(5), || metrics.checks_total() >= 2).await;
        assert!(swept, "initial sweep never finished");

        let snapshot = harness.metrics.snapshot();
        assert_eq!(snapshot.checks_total, 2);
        assert_eq!(snapshot.check_failures_total, 1);
        assert_eq!(snapshot.stream_status.get("ok"), Some(&1));
        assert_eq!(snapshot.stream_status.get("missing"), Some(&0));

        let exporter = PrometheusExporter::new(Arc::clone(&harness.metrics));
        let output = exporter.export();
        assert!(output.contains("streamwatch_checks_total 2"));
        assert!(output.contains("streamwatch_stream_status{stream_id=\"ok\"} 1"));
        assert!(output.contains(
            "streamwatch_stream_check_failed_total{stream_id=\"missing\",reason=\"http_404\"} 1"
        ));

        harness.monitor.stop().await.expect("Failed to stop");
    }
}
