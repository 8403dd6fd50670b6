//! API route modules.
//!
//! Organizes routes by resource type.

pub mod health;
pub mod stats;
pub mod streams;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;
use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/streams", streams::router())
        .nest("/api/v1/stats", stats::router())
        .nest("/health", health::router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
