//! REST API server module.
//!
//! Provides HTTP endpoints for stream health status, aggregate statistics,
//! on-demand checks, and orchestration health probes.

pub mod error;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
