//! OpenAPI documentation configuration.
//!
//! This module configures OpenAPI 3.0 specification generation using `utoipa`.
//! Swagger UI is served at `/docs` by the main router.

use utoipa::OpenApi;

use crate::api::models::{HealthResponse, StatsResponse, StreamStatusResponse};

/// Liveness check response.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct LivenessResponse {
    /// Status indicator (always "alive" if responding)
    pub status: String,
    /// Server uptime in seconds
    pub uptime_secs: u64,
}

/// Generic message response for operations that return only a status message.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// Status or result message
    pub message: String,
}

/// OpenAPI documentation for the streamwatch API.
///
/// This struct aggregates all documented endpoints and schemas.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "streamwatch API",
        version = "0.1.0",
        description = "REST API for the streamwatch live-stream health monitor. Provides endpoints for per-stream health status, aggregate statistics, and on-demand checks.",
        license(name = "MIT OR Apache-2.0"),
        contact(name = "streamwatch", url = "https://github.com/streamwatch/streamwatch")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "health", description = "Health check endpoints for monitoring and orchestration"),
        (name = "streams", description = "Stream health status and on-demand check endpoints"),
        (name = "stats", description = "Aggregate health statistics endpoints")
    ),
    paths(
        // Health endpoints
        crate::api::routes::health::health_check,
        crate::api::routes::health::readiness_check,
        crate::api::routes::health::liveness_check,
        // Stream endpoints
        crate::api::routes::streams::list_streams,
        crate::api::routes::streams::get_stream,
        crate::api::routes::streams::trigger_check,
        // Stats endpoints
        crate::api::routes::stats::get_stats,
    ),
    components(
        schemas(
            // Health schemas
            HealthResponse,
            LivenessResponse,
            MessageResponse,
            // Error schema
            crate::api::error::ApiErrorResponse,
            // Stream schemas
            StreamStatusResponse,
            StatsResponse,
        )
    )
)]
pub struct ApiDoc;
