//! streamwatch library crate.
//!
//! This module exposes the core functionality for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod panic_hook;
pub mod registry;

pub use error::{Error, Result};
