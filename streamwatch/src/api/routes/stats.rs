//! Aggregate statistics routes.

use axum::{Json, Router, extract::State, routing::get};

use crate::api::error::ApiResult;
use crate::api::models::StatsResponse;
use crate::api::server::AppState;

/// Create the stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Aggregate health counts", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let summary = state.monitor.stats();
    let uptime = state.start_time.elapsed().as_secs();

    Ok(Json(StatsResponse::from_summary(summary, uptime)))
}
