//! Thread-safe store for per-stream health records.
//!
//! The registry owns every [`HealthRecord`] for the lifetime of the process.
//! All mutation funnels through [`StreamRegistry::apply_outcome`]; readers get
//! copies, never references into the guarded map.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::registry::types::{HealthRecord, ProbeOutcome, StreamDefinition, StreamSnapshot};

/// Authoritative mapping of stream id to current health state.
///
/// Definitions are fixed at construction; one record per definition is
/// created up front (`healthy = false`, counters at zero, never checked) and
/// unknown ids never create records implicitly.
pub struct StreamRegistry {
    /// Configured streams, in configuration order. Immutable.
    definitions: Vec<StreamDefinition>,
    /// Health records keyed by stream id. Guarded by a coarse lock; per-record
    /// contention is negligible at typical stream counts.
    records: RwLock<HashMap<String, HealthRecord>>,
}

impl StreamRegistry {
    /// Build the registry with one fresh record per definition.
    pub fn new(definitions: Vec<StreamDefinition>) -> Self {
        let records = definitions
            .iter()
            .map(|definition| (definition.id.clone(), HealthRecord::default()))
            .collect();

        Self {
            definitions,
            records: RwLock::new(records),
        }
    }

    /// Number of configured streams.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Whether a stream id is configured.
    pub fn contains(&self, id: &str) -> bool {
        self.records.read().contains_key(id)
    }

    /// Point-in-time copy of every stream's state, in configuration order.
    pub fn snapshot_all(&self) -> Vec<StreamSnapshot> {
        let records = self.records.read();
        self.definitions
            .iter()
            .map(|definition| StreamSnapshot {
                definition: definition.clone(),
                record: records.get(&definition.id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Point-in-time copy of one stream's state, or `None` for unknown ids.
    pub fn snapshot_one(&self, id: &str) -> Option<StreamSnapshot> {
        let definition = self.definitions.iter().find(|d| d.id == id)?.clone();
        let record = self.records.read().get(id).cloned().unwrap_or_default();
        Some(StreamSnapshot { definition, record })
    }

    /// The single mutation entry point: apply one probe outcome to its record.
    ///
    /// Sets `healthy`, `last_checked_at`, `last_message` and
    /// `response_time_ms` together under the write lock, and resets or bumps
    /// `consecutive_failures`. Returns a copy of the updated record. Outcomes
    /// for ids that were never configured are rejected with
    /// [`Error::StreamNotFound`].
    pub fn apply_outcome(&self, outcome: &ProbeOutcome) -> Result<HealthRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&outcome.stream_id)
            .ok_or_else(|| Error::stream_not_found(&outcome.stream_id))?;

        record.healthy = outcome.success;
        record.last_checked_at = Some(Utc::now());
        record.last_message = outcome.message.clone();
        record.response_time_ms = outcome.response_time_ms;
        record.consecutive_failures = if outcome.success {
            0
        } else {
            record.consecutive_failures.saturating_add(1)
        };

        Ok(record.clone())
    }
}
