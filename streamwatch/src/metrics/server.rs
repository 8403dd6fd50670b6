//! Standalone Prometheus exposition listener.
//!
//! Scrape traffic stays off the API listener: when enabled, `/metrics` is
//! served on its own host:port with the same graceful-shutdown discipline as
//! the API server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::MetricsConfig;
use crate::error::{Error, Result};
use crate::metrics::PrometheusExporter;

/// Content type of the Prometheus text exposition format.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Metrics HTTP server.
pub struct MetricsServer {
    config: MetricsConfig,
    exporter: Arc<PrometheusExporter>,
    cancel_token: CancellationToken,
}

impl MetricsServer {
    /// Create a new metrics server.
    pub fn new(
        config: MetricsConfig,
        exporter: Arc<PrometheusExporter>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            exporter,
            cancel_token,
        }
    }

    /// The router serving `GET /metrics`.
    pub fn router(exporter: Arc<PrometheusExporter>) -> Router {
        Router::new()
            .route("/metrics", get(serve_metrics))
            .with_state(exporter)
    }

    /// Bind and serve until the cancellation token fires.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| Error::server(format!("Invalid metrics address: {e}")))?;

        let router = Self::router(self.exporter.clone());
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Metrics server listening on http://{}/metrics", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("Metrics server shutting down...");
            })
            .await
            .map_err(|e| Error::server(format!("Metrics server error: {e}")))?;

        Ok(())
    }
}

async fn serve_metrics(State(exporter): State<Arc<PrometheusExporter>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        exporter.export(),
    )
}
