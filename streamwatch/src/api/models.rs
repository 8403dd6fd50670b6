//! API response models (DTOs).
//!
//! These models define the JSON shapes returned by the API, decoupled from
//! the internal registry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{StatsSummary, StreamSnapshot};

/// One stream's definition and latest health state.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StreamStatusResponse {
    /// Stream identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Probed URL
    pub url: String,
    /// Result of the most recent completed check (false until one succeeds)
    pub healthy: bool,
    /// When the most recent check completed (null before the first check)
    pub last_check: Option<DateTime<Utc>>,
    /// "OK", or a description of the most recent failure
    pub last_message: String,
    /// Duration of the most recent probe in milliseconds
    pub response_time_ms: u64,
    /// Failed checks since the last success
    pub consecutive_failures: u64,
}

impl From<StreamSnapshot> for StreamStatusResponse {
    fn from(snapshot: StreamSnapshot) -> Self {
        Self {
            id: snapshot.definition.id,
            name: snapshot.definition.name,
            url: snapshot.definition.url,
            healthy: snapshot.record.healthy,
            last_check: snapshot.record.last_checked_at,
            last_message: snapshot.record.last_message,
            response_time_ms: snapshot.record.response_time_ms,
            consecutive_failures: snapshot.record.consecutive_failures,
        }
    }
}

/// Aggregate health counts across all monitored streams.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StatsResponse {
    /// Number of configured streams
    pub total: usize,
    /// Streams whose most recent check succeeded
    pub healthy: usize,
    /// Streams unchecked or whose most recent check failed
    pub unhealthy: usize,
    /// Seconds since the service started
    pub uptime_secs: u64,
}

impl StatsResponse {
    pub fn from_summary(summary: StatsSummary, uptime_secs: u64) -> Self {
        Self {
            total: summary.total,
            healthy: summary.healthy,
            unhealthy: summary.unhealthy,
            uptime_secs,
        }
    }
}

/// Service health summary.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Overall status indicator
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the service started
    pub uptime_secs: u64,
    /// Monitor lifecycle state ("stopped", "running" or "stopping")
    pub monitor: String,
}
