//! Stream definitions, health records and the thread-safe registry.

mod store;
mod types;

pub use store::StreamRegistry;
pub use types::{
    FailureReason, HealthRecord, ProbeOutcome, StatsSummary, StreamDefinition, StreamSnapshot,
};
