//! Sweep scheduling and probe fan-out.
//!
//! The monitor runs one sweep immediately on start and then every check
//! interval. A sweep spawns one probe-and-apply task per configured stream;
//! tasks never block each other and every spawned task is tracked so `stop`
//! can drain them deterministically.
//!
//! Overlapping probes for the same stream (a sweep racing an on-demand
//! check) may apply out of order; readers can briefly observe the older of
//! two overlapping outcomes. Health state is eventually-consistent telemetry.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::metrics::MetricsCollector;
use crate::monitor::prober::Prober;
use crate::registry::{
    ProbeOutcome, StatsSummary, StreamDefinition, StreamRegistry, StreamSnapshot,
};

/// Monitor lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
    Stopping,
}

impl MonitorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Periodic health-check scheduler and query facade.
///
/// Owns the sweep ticker task and the set of in-flight probe tasks. All
/// probe results funnel into the registry's single mutation entry point and
/// the injected metrics collector, from the probe task itself.
pub struct StreamMonitor {
    registry: Arc<StreamRegistry>,
    prober: Arc<Prober>,
    metrics: Arc<MetricsCollector>,
    config: MonitorConfig,
    state: RwLock<MonitorState>,
    /// Replaced with a fresh token on every start so the monitor can be
    /// restarted after a full stop.
    cancel_token: Mutex<CancellationToken>,
    sweep_handle: Mutex<Option<JoinHandle<()>>>,
    /// In-flight probe tasks, sweep-driven and on-demand alike. `None` while
    /// stopped.
    tasks: Arc<Mutex<Option<JoinSet<()>>>>,
}

impl StreamMonitor {
    /// Create a monitor in the `Stopped` state.
    pub fn new(
        registry: Arc<StreamRegistry>,
        prober: Arc<Prober>,
        metrics: Arc<MetricsCollector>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            registry,
            prober,
            metrics,
            config,
            state: RwLock::new(MonitorState::Stopped),
            cancel_token: Mutex::new(CancellationToken::new()),
            sweep_handle: Mutex::new(None),
            tasks: Arc::new(Mutex::new(None)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    // ==================== Lifecycle ====================

    /// Transition Stopped→Running and spawn the sweep loop.
    ///
    /// The first sweep runs immediately; subsequent sweeps follow every
    /// check interval until [`stop`](Self::stop).
    pub fn start(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != MonitorState::Stopped {
                return Err(Error::invalid_transition(
                    state.as_str(),
                    MonitorState::Running.as_str(),
                ));
            }
            *state = MonitorState::Running;
        }

        if self.registry.is_empty() {
            warn!("No streams configured; sweeps will check nothing");
        }

        let cancel_token = CancellationToken::new();
        *self.cancel_token.lock() = cancel_token.clone();
        *self.tasks.lock() = Some(JoinSet::new());

        let registry = Arc::clone(&self.registry);
        let prober = Arc::clone(&self.prober);
        let metrics = Arc::clone(&self.metrics);
        let tasks = Arc::clone(&self.tasks);
        let check_interval = self.config.check_interval();

        let handle = tokio::spawn(async move {
            // The first tick completes immediately, giving the initial sweep.
            let mut ticker = tokio::time::interval(check_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        debug!("Sweep loop received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        Self::run_sweep(&registry, &prober, &metrics, &tasks, &cancel_token);
                    }
                }
            }
        });
        *self.sweep_handle.lock() = Some(handle);

        info!(
            streams = self.registry.len(),
            interval_secs = self.config.check_interval_secs,
            "Stream monitor started"
        );
        Ok(())
    }

    /// Transition Running→Stopping, cancel the ticker and in-flight probes,
    /// and wait until every tracked task has finished. Idempotent: stopping a
    /// monitor that is not running is a no-op.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != MonitorState::Running {
                debug!(state = %*state, "Stop requested but monitor is not running");
                return Ok(());
            }
            *state = MonitorState::Stopping;
        }

        info!("Stopping stream monitor");
        self.cancel_token.lock().cancel();

        // The loop exits at its next select point; after it is joined no new
        // sweep tasks can appear.
        let sweep_handle = self.sweep_handle.lock().take();
        if let Some(handle) = sweep_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Sweep loop task failed during shutdown");
            }
        }

        let join_set = {
            let mut tasks = self.tasks.lock();
            tasks.take()
        };
        if let Some(mut join_set) = join_set {
            debug!(in_flight = join_set.len(), "Draining in-flight probe tasks");
            while join_set.join_next().await.is_some() {}
        }

        *self.state.write() = MonitorState::Stopped;
        info!("Stream monitor stopped");
        Ok(())
    }

    // ==================== Checks ====================

    /// Launch one probe-and-apply task outside the sweep cadence.
    ///
    /// Returns as soon as the task is spawned; `Ok` is the "initiated"
    /// acknowledgement. A monitor that is not running refuses all new work
    /// with [`Error::ShuttingDown`], even for unknown ids.
    pub fn trigger_check(&self, id: &str) -> Result<()> {
        // Holding the state read lock across the spawn pins the monitor in
        // Running: stop() needs the write lock before it can drain.
        let state = self.state.read();
        if *state != MonitorState::Running {
            return Err(Error::ShuttingDown);
        }

        let snapshot = self
            .registry
            .snapshot_one(id)
            .ok_or_else(|| Error::stream_not_found(id))?;

        let cancel_token = self.cancel_token.lock().clone();
        let mut guard = self.tasks.lock();
        let Some(set) = guard.as_mut() else {
            return Err(Error::ShuttingDown);
        };
        Self::spawn_probe_task(
            set,
            &self.registry,
            &self.prober,
            &self.metrics,
            &cancel_token,
            snapshot.definition,
        );

        debug!(stream_id = %id, "On-demand check initiated");
        Ok(())
    }

    /// Snapshot ids and fan out one tracked probe task per stream.
    fn run_sweep(
        registry: &Arc<StreamRegistry>,
        prober: &Arc<Prober>,
        metrics: &Arc<MetricsCollector>,
        tasks: &Mutex<Option<JoinSet<()>>>,
        cancel_token: &CancellationToken,
    ) {
        let snapshots = registry.snapshot_all();
        if snapshots.is_empty() {
            return;
        }
        debug!(streams = snapshots.len(), "Starting sweep");

        let mut guard = tasks.lock();
        let Some(set) = guard.as_mut() else {
            return;
        };
        // Reap handles of probes that finished since the last sweep so the
        // set only ever holds live tasks.
        while set.try_join_next().is_some() {}

        for snapshot in snapshots {
            Self::spawn_probe_task(
                set,
                registry,
                prober,
                metrics,
                cancel_token,
                snapshot.definition,
            );
        }
    }

    /// Spawn one probe-and-apply task into the tracked set. The task races
    /// the cancellation token so stop() aborts probes mid-flight instead of
    /// waiting out their timeout.
    fn spawn_probe_task(
        set: &mut JoinSet<()>,
        registry: &Arc<StreamRegistry>,
        prober: &Arc<Prober>,
        metrics: &Arc<MetricsCollector>,
        cancel_token: &CancellationToken,
        definition: StreamDefinition,
    ) {
        let registry = Arc::clone(registry);
        let prober = Arc::clone(prober);
        let metrics = Arc::clone(metrics);
        let cancel_token = cancel_token.clone();

        set.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    debug!(stream_id = %definition.id, "Probe cancelled during shutdown");
                }
                outcome = prober.probe(&definition) => {
                    Self::record_outcome(&registry, &metrics, &outcome);
                }
            }
        });
    }

    /// Apply one outcome to the registry and notify metrics. Probe failures
    /// are data here, never errors; only an outcome for an unknown id is
    /// dropped (with a warning).
    fn record_outcome(
        registry: &StreamRegistry,
        metrics: &MetricsCollector,
        outcome: &ProbeOutcome,
    ) {
        match registry.apply_outcome(outcome) {
            Ok(record) => {
                if outcome.success {
                    metrics.record_success(&outcome.stream_id, outcome.response_time_ms);
                    debug!(
                        stream_id = %outcome.stream_id,
                        response_time_ms = outcome.response_time_ms,
                        "Stream healthy"
                    );
                } else {
                    let reason = outcome
                        .failure_reason
                        .as_ref()
                        .map(|r| r.label())
                        .unwrap_or_else(|| "unknown".to_string());
                    metrics.record_failure(&outcome.stream_id, &reason, outcome.response_time_ms);
                    warn!(
                        stream_id = %outcome.stream_id,
                        reason = %reason,
                        message = %outcome.message,
                        consecutive_failures = record.consecutive_failures,
                        "Stream check failed"
                    );
                }
            }
            Err(_) => {
                warn!(stream_id = %outcome.stream_id, "Dropping outcome for unknown stream");
            }
        }
    }

    // ==================== Queries ====================

    /// Copy of every stream's state, in configuration order.
    pub fn list_statuses(&self) -> Vec<StreamSnapshot> {
        self.registry.snapshot_all()
    }

    /// Copy of one stream's state.
    pub fn get_status(&self, id: &str) -> Result<StreamSnapshot> {
        self.registry
            .snapshot_one(id)
            .ok_or_else(|| Error::stream_not_found(id))
    }

    /// Aggregate counts folded from a single snapshot, so the parts always
    /// sum to the total.
    pub fn stats(&self) -> StatsSummary {
        let snapshots = self.registry.snapshot_all();
        let healthy = snapshots.iter().filter(|s| s.record.healthy).count();
        StatsSummary {
            total: snapshots.len(),
            healthy,
            unhealthy: snapshots.len() - healthy,
        }
    }
}
