//! Prometheus metrics exporter.
//!
//! Renders the collector's snapshot in the Prometheus text exposition format.
//! Label sets are emitted in sorted order so the output is stable between
//! scrapes of an unchanged collector.

use std::sync::Arc;

use super::collector::MetricsCollector;

/// Prometheus metrics exporter.
pub struct PrometheusExporter {
    collector: Arc<MetricsCollector>,
    namespace: String,
}

impl PrometheusExporter {
    /// Create a new Prometheus exporter.
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self {
            collector,
            namespace: "streamwatch".to_string(),
        }
    }

    /// Create a new Prometheus exporter with a custom namespace.
    pub fn with_namespace(collector: Arc<MetricsCollector>, namespace: impl Into<String>) -> Self {
        Self {
            collector,
            namespace: namespace.into(),
        }
    }

    /// Export all metrics in Prometheus text format.
    pub fn export(&self) -> String {
        let snapshot = self.collector.snapshot();
        let mut output = String::new();

        self.write_scalar(
            &mut output,
            "checks_total",
            "counter",
            "Total probe checks across all streams",
            snapshot.checks_total as f64,
        );

        self.write_scalar(
            &mut output,
            "check_failures_total",
            "counter",
            "Total failed probe checks across all streams",
            snapshot.check_failures_total as f64,
        );

        // Per-stream health gauge (1 healthy / 0 unhealthy)
        let name = self.write_header(
            &mut output,
            "stream_status",
            "gauge",
            "Current stream health (1 healthy, 0 unhealthy)",
        );
        for (stream_id, value) in sorted(&snapshot.stream_status) {
            Self::write_sample(&mut output, &name, &[("stream_id", stream_id)], value as f64);
        }

        let name = self.write_header(
            &mut output,
            "stream_check_success_total",
            "counter",
            "Successful checks by stream",
        );
        for (stream_id, value) in sorted(&snapshot.check_success_by_stream) {
            Self::write_sample(&mut output, &name, &[("stream_id", stream_id)], value as f64);
        }

        let name = self.write_header(
            &mut output,
            "stream_check_failed_total",
            "counter",
            "Failed checks by stream and failure reason",
        );
        let mut failed: Vec<_> = snapshot.check_failed_by_stream.iter().collect();
        failed.sort_by(|a, b| a.0.cmp(b.0));
        for (stream_id, by_reason) in failed {
            for (reason, value) in sorted(by_reason) {
                Self::write_sample(
                    &mut output,
                    &name,
                    &[("stream_id", stream_id), ("reason", reason)],
                    value as f64,
                );
            }
        }

        let name = self.write_header(
            &mut output,
            "stream_response_time_ms",
            "gauge",
            "Last observed probe duration by stream in milliseconds",
        );
        for (stream_id, value) in sorted(&snapshot.response_time_last_ms) {
            Self::write_sample(&mut output, &name, &[("stream_id", stream_id)], value as f64);
        }

        let name = self.write_header(
            &mut output,
            "stream_response_time_avg_ms",
            "gauge",
            "Average probe duration by stream in milliseconds",
        );
        let mut averages: Vec<_> = snapshot.response_time_avg_ms.iter().collect();
        averages.sort_by(|a, b| a.0.cmp(b.0));
        for (stream_id, value) in averages {
            Self::write_sample(&mut output, &name, &[("stream_id", stream_id)], *value);
        }

        output
    }

    /// Emit an unlabeled single-sample metric with its metadata.
    fn write_scalar(&self, output: &mut String, name: &str, kind: &str, help: &str, value: f64) {
        let full_name = self.write_header(output, name, kind, help);
        output.push_str(&format!("{full_name} {value}\n"));
    }

    /// Emit `# HELP` / `# TYPE` lines and return the namespaced metric name.
    fn write_header(&self, output: &mut String, name: &str, kind: &str, help: &str) -> String {
        let full_name = format!("{}_{}", self.namespace, name);
        output.push_str(&format!("# HELP {full_name} {help}\n"));
        output.push_str(&format!("# TYPE {full_name} {kind}\n"));
        full_name
    }

    fn write_sample(output: &mut String, full_name: &str, labels: &[(&str, &str)], value: f64) {
        let labels_str = labels
            .iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect::<Vec<_>>()
            .join(",");
        output.push_str(&format!("{full_name}{{{labels_str}}} {value}\n"));
    }
}

fn sorted(map: &std::collections::HashMap<String, u64>) -> Vec<(&String, u64)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_default_namespace() {
        let collector = Arc::new(MetricsCollector::new());
        let exporter = PrometheusExporter::new(collector);
        assert_eq!(exporter.namespace, "streamwatch");
    }

    #[test]
    fn test_export_empty_collector() {
        let collector = Arc::new(MetricsCollector::new());
        let exporter = PrometheusExporter::new(collector);
        let output = exporter.export();

        assert!(output.contains("# HELP streamwatch_checks_total"));
        assert!(output.contains("# TYPE streamwatch_checks_total counter"));
        assert!(output.contains("streamwatch_checks_total 0"));
        assert!(output.contains("# TYPE streamwatch_stream_status gauge"));
    }

    #[test]
    fn test_export_labeled_samples() {
        let collector = Arc::new(MetricsCollector::new());
        collector.record_success("cam1", 50);
        collector.record_failure("cam2", "timeout", 5000);

        let exporter = PrometheusExporter::new(collector);
        let output = exporter.export();

        assert!(output.contains("streamwatch_stream_status{stream_id=\"cam1\"} 1"));
        assert!(output.contains("streamwatch_stream_status{stream_id=\"cam2\"} 0"));
        assert!(output.contains("streamwatch_stream_check_success_total{stream_id=\"cam1\"} 1"));
        assert!(output.contains(
            "streamwatch_stream_check_failed_total{stream_id=\"cam2\",reason=\"timeout\"} 1"
        ));
        assert!(output.contains("streamwatch_stream_response_time_ms{stream_id=\"cam1\"} 50"));
    }

    #[test]
    fn test_export_custom_namespace() {
        let collector = Arc::new(MetricsCollector::new());
        collector.record_success("cam1", 10);

        let exporter = PrometheusExporter::with_namespace(collector, "probe");
        let output = exporter.export();

        assert!(output.contains("probe_checks_total 1"));
        assert!(!output.contains("streamwatch_"));
    }

    #[test]
    fn test_export_sorted_stream_labels() {
        let collector = Arc::new(MetricsCollector::new());
        collector.record_success("zeta", 1);
        collector.record_success("alpha", 1);

        let exporter = PrometheusExporter::new(collector);
        let output = exporter.export();

        let alpha = output.find("stream_status{stream_id=\"alpha\"}").unwrap();
        let zeta = output.find("stream_status{stream_id=\"zeta\"}").unwrap();
        assert!(alpha < zeta);
    }
}
