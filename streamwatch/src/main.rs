use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use streamwatch::api::{ApiServer, AppState};
use streamwatch::config::AppConfig;
use streamwatch::metrics::{MetricsCollector, MetricsServer, PrometheusExporter};
use streamwatch::monitor::{Prober, StreamMonitor};
use streamwatch::registry::StreamRegistry;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Time the HTTP servers get to finish in-flight requests on shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load_from_env()?;
    let _log_guard = streamwatch::logging::init_logging(&config.log)?;
    streamwatch::panic_hook::install(config.log.dir.clone());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        streams = config.streams.len(),
        interval_secs = config.monitor.check_interval_secs,
        "Starting streamwatch"
    );

    // Wire the core services
    let registry = Arc::new(StreamRegistry::new(config.streams.clone()));
    let metrics = Arc::new(MetricsCollector::new());
    let prober = Arc::new(Prober::new(config.monitor.timeout())?);
    let monitor = Arc::new(StreamMonitor::new(
        Arc::clone(&registry),
        prober,
        Arc::clone(&metrics),
        config.monitor.clone(),
    ));

    monitor.start()?;

    // Serve until a shutdown signal arrives or a server dies
    let shutdown = CancellationToken::new();
    let mut servers: JoinSet<streamwatch::Result<()>> = JoinSet::new();

    let api_server = ApiServer::new(
        config.server.clone(),
        AppState::new(Arc::clone(&monitor)),
        shutdown.clone(),
    );
    servers.spawn(async move { api_server.run().await });

    if config.metrics.enabled {
        let exporter = Arc::new(PrometheusExporter::new(Arc::clone(&metrics)));
        let metrics_server =
            MetricsServer::new(config.metrics.clone(), exporter, shutdown.clone());
        servers.spawn(async move { metrics_server.run().await });
    }

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
        Some(result) = servers.join_next() => {
            // A server exiting before any shutdown request is fatal.
            shutdown.cancel();
            monitor.stop().await?;
            match result {
                Ok(Ok(())) => anyhow::bail!("Server exited unexpectedly"),
                Ok(Err(e)) => return Err(e.into()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    // Stop probing first so no new results land while the servers drain.
    monitor.stop().await?;
    shutdown.cancel();

    let drained = tokio::time::timeout(DEFAULT_SHUTDOWN_TIMEOUT, async {
        while let Some(result) = servers.join_next().await {
            if let Ok(Err(e)) = result {
                warn!(error = %e, "Server reported an error during shutdown");
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!("Shutdown timeout reached, forcing shutdown");
    }

    info!("streamwatch stopped");
    Ok(())
}

/// Completes on ctrl-c or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
