//! Core domain types for stream health tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured stream endpoint. Immutable after configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Unique stream identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// URL probed for liveness.
    pub url: String,
}

impl StreamDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Mutable per-stream health state, owned exclusively by the registry.
///
/// Records are created once per configured stream and never removed; every
/// field is overwritten together by a single applied probe outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Whether the last probe succeeded.
    pub healthy: bool,
    /// When the last probe outcome was applied. `None` until the first probe.
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Human-readable outcome of the last probe ("OK", "HTTP 503", ...).
    pub last_message: String,
    /// Wall-clock duration of the last probe in milliseconds.
    pub response_time_ms: u64,
    /// Failed probes since the last success. Reset to 0 on any success.
    pub consecutive_failures: u64,
}

/// Why a probe failed. The label string feeds the failure-counter metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport, DNS or connect failure.
    ConnectionError,
    /// The probe timeout elapsed before response headers arrived.
    Timeout,
    /// The endpoint answered with a non-200 status.
    HttpStatus(u16),
    /// The request could not be built and never left the process.
    RequestError,
}

impl FailureReason {
    pub fn label(&self) -> String {
        match self {
            Self::ConnectionError => "connection_error".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::HttpStatus(status) => format!("http_{status}"),
            Self::RequestError => "request_error".to_string(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The result of a single probe, consumed once by `StreamRegistry::apply_outcome`.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub stream_id: String,
    pub success: bool,
    pub message: String,
    pub response_time_ms: u64,
    /// Present exactly when `success` is false.
    pub failure_reason: Option<FailureReason>,
}

impl ProbeOutcome {
    /// A successful probe. The message is always "OK".
    pub fn success(stream_id: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            stream_id: stream_id.into(),
            success: true,
            message: "OK".to_string(),
            response_time_ms,
            failure_reason: None,
        }
    }

    /// A failed probe with a classification and a descriptive message.
    pub fn failure(
        stream_id: impl Into<String>,
        reason: FailureReason,
        message: impl Into<String>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            success: false,
            message: message.into(),
            response_time_ms,
            failure_reason: Some(reason),
        }
    }
}

/// A point-in-time copy of one stream's definition and health state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub definition: StreamDefinition,
    pub record: HealthRecord,
}

/// Aggregate health counts. `healthy + unhealthy == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
}
