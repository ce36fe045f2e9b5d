//! Adaptive request dispatch engine (v1)
//!
//! Routes logical requests to a pool of heterogeneous backend endpoints.
//!
//! # Architecture Overview
//!
//! ```text
//!   DispatchRequest
//!        │
//!        ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ rule table   │──▶│  registry    │──▶│  strategy    │
//!   │ (category)   │   │ (candidates) │   │  selection   │
//!   └──────────────┘   └──────┬───────┘   └──────┬───────┘
//!                             │                  │
//!                             │                  ▼
//!                             │           ┌──────────────┐
//!                             │◀──────────│  downstream  │──▶ Backend
//!                             │ telemetry │  executor    │
//!                             │           └──────────────┘
//!                             ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ health sweep │   │   history    │   │  admin API   │
//!   └──────────────┘   └──────────────┘   └──────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use dispatch_engine::admin::{setup_admin_router, AdminState};
use dispatch_engine::config::watcher::ConfigWatcher;
use dispatch_engine::config::{load_config, EngineConfig};
use dispatch_engine::dispatch::{Dispatcher, HttpExecutor};
use dispatch_engine::health::HealthMonitor;
use dispatch_engine::lifecycle::{build_dispatcher, shutdown_signal, Shutdown};
use dispatch_engine::observability::{logging, metrics};
use dispatch_engine::routing::RoutingRuleTable;

#[derive(Parser)]
#[command(name = "dispatch-engine")]
#[command(about = "Adaptive request dispatch engine", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dispatch-engine starting");
    tracing::info!(
        config = ?args.config,
        endpoints = config.endpoints.len(),
        rules = config.rules.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = build_dispatcher(&config, Arc::new(HttpExecutor::new()))?;
    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    let monitor = HealthMonitor::new(dispatcher.registry().clone(), config.health_check.clone());
    tasks.push(tokio::spawn(monitor.run(shutdown.subscribe())));

    // The watcher handle must outlive the reload loop.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => {
                    tasks.push(tokio::spawn(apply_reloads(
                        dispatcher.clone(),
                        updates,
                        shutdown.subscribe(),
                    )));
                    Some(handle)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start config watcher, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let app = setup_admin_router(AdminState::new(
            dispatcher.clone(),
            config.admin.api_key.clone(),
        ));
        let mut admin_shutdown = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin server failed");
            }
        }));
    }

    shutdown_signal().await;
    tracing::info!("Shutting down");
    shutdown.trigger();
    for task in tasks {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Apply validated config reloads until shutdown.
async fn apply_reloads(
    dispatcher: Arc<Dispatcher>,
    mut updates: tokio::sync::mpsc::UnboundedReceiver<EngineConfig>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { break };
                dispatcher.reload_rules(RoutingRuleTable::new(&config.rules, config.default_rule.clone()));
                dispatcher.registry().reconcile(&config.endpoints);
                tracing::info!(
                    endpoints = dispatcher.registry().len(),
                    "Configuration reloaded"
                );
            }
            _ = shutdown.recv() => break,
        }
    }
}
