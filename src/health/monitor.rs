//! Periodic health sweeps.
//!
//! # Responsibilities
//! - Run a sweep over the registry on a fixed interval
//! - Stop promptly on shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::prober::{self, HealthProber};
use crate::health::sweep::sweep;
use crate::registry::EndpointRegistry;

pub struct HealthMonitor {
    registry: Arc<EndpointRegistry>,
    prober: Box<dyn HealthProber>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    /// Monitor using the prober selected by `config.probe`.
    pub fn new(registry: Arc<EndpointRegistry>, config: HealthCheckConfig) -> Self {
        let prober = prober::from_config(&config);
        Self::with_prober(registry, prober, config)
    }

    pub fn with_prober(
        registry: Arc<EndpointRegistry>,
        prober: Box<dyn HealthProber>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            registry,
            prober,
            config,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Health sweeps disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            probe = ?self.config.probe,
            "Health monitor starting"
        );

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        // The first tick fires immediately; endpoints start healthy, so skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep(&self.registry, self.prober.as_ref(), timeout).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
