// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plexus serve` command implementation.
//!
//! Opens the SQLite store, wires the engine with the WebSocket session
//! registry as its real-time channel, and serves the gateway until SIGINT
//! or SIGTERM.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use plexus_config::PlexusConfig;
use plexus_core::{BestEffort, PlexusError, PluginAdapter, StorageAdapter};
use plexus_engine::Engine;
use plexus_gateway::{GatewayState, SessionRegistry, start_server};
use plexus_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Crate targets that log at the configured level.
const CRATE_TARGETS: &[&str] = &[
    "plexus",
    "plexus_core",
    "plexus_config",
    "plexus_storage",
    "plexus_notify",
    "plexus_graph",
    "plexus_engine",
    "plexus_gateway",
];

pub async fn run_serve(config: PlexusConfig) -> Result<(), PlexusError> {
    init_tracing(&config.server.log_level);
    info!("starting plexus serve");

    let metrics_render = match install_metrics() {
        Ok(render) => Some(render),
        Err(e) => {
            warn!(error = %e, "prometheus initialization failed, continuing without metrics");
            None
        }
    };

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
    info!(path = %config.storage.database_path, "storage initialized");

    let registry = Arc::new(SessionRegistry::new(config.gateway.session_buffer));
    let engine = Arc::new(Engine::new(&config, storage.clone(), registry.clone()));

    let mut state = GatewayState::new(engine, registry.clone());
    if let Some(render) = metrics_render {
        state = state.with_metrics(render);
    }

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.gateway, state, cancel).await;

    registry.shutdown().await.best_effort("close live sessions");
    storage.close().await?;
    served?;

    info!("plexus serve shutdown complete");
    Ok(())
}

/// Install the global Prometheus recorder and describe the engine's metrics.
fn install_metrics() -> Result<Arc<dyn Fn() -> String + Send + Sync>, PlexusError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        PlexusError::Internal(format!("failed to install Prometheus recorder: {e}"))
    })?;
    plexus_notify::recording::register_metrics();
    info!("prometheus metrics recorder installed");
    Ok(Arc::new(move || handle.render()))
}

fn default_filter(log_level: &str) -> String {
    let mut directives: Vec<String> = CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
