// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowdeck serve` command implementation.
//!
//! Wires the plugin hub, record client, scheduler monitor, and dashboard
//! server together. Plugin discovery runs once at startup; a registry failure
//! degrades to zero plugins with a persistent banner and the server starts
//! regardless. Operators can re-run discovery from the home page.

use std::sync::Arc;
use std::time::Duration;

use flowdeck_config::FlowdeckConfig;
use flowdeck_core::FlowdeckError;
use flowdeck_plugin::{GuestLimits, PluginHub, RegistryClient, WasmPluginLoader};
use flowdeck_records::RecordClient;
use flowdeck_web::poller::SchedulerMonitor;
use flowdeck_web::server::{AppState, ServerConfig};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Runs the `flowdeck serve` command.
pub async fn run_serve(config: FlowdeckConfig) -> Result<(), FlowdeckError> {
    init_tracing(&config.server.log_level);

    info!("starting flowdeck serve");

    let api_timeout = Duration::from_secs(config.backend.request_timeout_secs);
    let registry = Arc::new(RegistryClient::new(&config.backend.base_url, api_timeout)?);
    let records = Arc::new(RecordClient::new(&config.backend.base_url, api_timeout)?);
    let host = flowdeck_web::standard_host_capabilities();

    let loader = Arc::new(WasmPluginLoader::new(
        registry.clone(),
        host.clone(),
        GuestLimits {
            fuel: config.plugins.render_fuel,
            epoch_timeout_secs: config.plugins.render_timeout_secs,
        },
        Duration::from_secs(config.plugins.load_timeout_secs),
    )?);
    let hub = Arc::new(PluginHub::new(loader));

    // Initial plugin discovery. Failure is never fatal: the dashboard runs
    // with zero plugins and a persistent banner.
    let registry_banner = Arc::new(RwLock::new(None));
    if config.plugins.enabled {
        match hub.refresh_from_registry(&registry).await {
            Ok(count) => info!(count, "plugin discovery completed"),
            Err(error) => {
                warn!(%error, "plugin discovery failed at startup");
                *registry_banner.write().await =
                    Some(format!("Plugin registry unavailable: {error}"));
            }
        }
    } else {
        info!("plugin subsystem disabled by configuration");
    }

    // Scheduler monitor polls for the application's lifetime.
    let (scheduler_rx, _scheduler_task) = SchedulerMonitor::new(
        records.clone(),
        Duration::from_secs(config.scheduler.poll_interval_secs),
    )
    .spawn();

    let state = AppState {
        hub,
        host,
        records,
        registry,
        scheduler: scheduler_rx,
        registry_banner,
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    flowdeck_web::start_server(&server_config, state).await
}

/// Initializes the tracing subscriber.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowdeck={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
