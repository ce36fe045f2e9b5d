//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry, history and dispatcher from a validated config
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The executor is injected so tests can script downstream behaviour

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::dispatch::{Dispatcher, DownstreamExecutor};
use crate::history::MetricsRecorder;
use crate::registry::{EndpointRegistry, RegistryError};

/// Assemble a dispatcher and its shared state.
pub fn build_dispatcher(
    config: &EngineConfig,
    executor: Arc<dyn DownstreamExecutor>,
) -> Result<Arc<Dispatcher>, RegistryError> {
    let registry = Arc::new(EndpointRegistry::from_config(
        &config.endpoints,
        config.scoring.clone(),
    )?);
    let recorder = Arc::new(MetricsRecorder::new(config.history.capacity));

    tracing::info!(
        endpoints = registry.len(),
        rules = config.rules.len(),
        history_capacity = recorder.capacity(),
        "Dispatch engine initialised"
    );

    Ok(Arc::new(Dispatcher::from_config(
        config, registry, recorder, executor,
    )))
}
