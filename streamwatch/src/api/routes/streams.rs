//! Stream status routes.
//!
//! Read-only status queries plus the on-demand check trigger.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::StreamStatusResponse;
use crate::api::openapi::MessageResponse;
use crate::api::server::AppState;

/// Create the streams router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_streams))
        .route("/{id}", get(get_stream))
        .route("/{id}/check", post(trigger_check))
}

#[utoipa::path(
    get,
    path = "/api/v1/streams",
    tag = "streams",
    responses(
        (status = 200, description = "Status of every configured stream", body = Vec<StreamStatusResponse>)
    )
)]
pub async fn list_streams(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StreamStatusResponse>>> {
    let statuses = state
        .monitor
        .list_statuses()
        .into_iter()
        .map(StreamStatusResponse::from)
        .collect();

    Ok(Json(statuses))
}

#[utoipa::path(
    get,
    path = "/api/v1/streams/{id}",
    tag = "streams",
    params(("id" = String, Path, description = "Stream ID")),
    responses(
        (status = 200, description = "Status of one stream", body = StreamStatusResponse),
        (status = 404, description = "Stream not found", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn get_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StreamStatusResponse>> {
    let snapshot = state.monitor.get_status(&id).map_err(ApiError::from)?;

    Ok(Json(StreamStatusResponse::from(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/v1/streams/{id}/check",
    tag = "streams",
    params(("id" = String, Path, description = "Stream ID")),
    responses(
        (status = 202, description = "Check initiated; the result lands asynchronously", body = crate::api::openapi::MessageResponse),
        (status = 404, description = "Stream not found", body = crate::api::error::ApiErrorResponse),
        (status = 503, description = "Monitor is shutting down", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn trigger_check(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state.monitor.trigger_check(&id).map_err(ApiError::from)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Stream check initiated".to_string(),
        }),
    ))
}
