//! One pass of probe feedback over the registry.

use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::time;

use crate::health::prober::{HealthProber, ProbeError};
use crate::observability::metrics;
use crate::registry::EndpointRegistry;

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub probed: usize,
    pub healthy: usize,
    pub unhealthy: usize,
}

/// Probe every registered endpoint concurrently and apply the results.
///
/// Healthy endpoints recover by the configured recovery step, failing ones
/// lose the penalty step. A probe that overruns `timeout` counts as failed.
pub async fn sweep(
    registry: &EndpointRegistry,
    prober: &dyn HealthProber,
    timeout: Duration,
) -> SweepSummary {
    let endpoints = registry.all();
    let probes = endpoints.iter().map(|endpoint| async move {
        let result = match time::timeout(timeout, prober.probe(endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout),
        };
        (endpoint, result)
    });

    let mut summary = SweepSummary::default();
    for (endpoint, result) in join_all(probes).await {
        let healthy = match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint.id,
                    address = %endpoint.address,
                    error = %e,
                    "Health probe failed"
                );
                false
            }
        };

        // Deregistered mid-sweep: nothing to update.
        let Some(updated) = registry.record_probe(endpoint.id.as_str(), healthy) else {
            continue;
        };
        metrics::record_endpoint_state(&updated);

        summary.probed += 1;
        if healthy {
            summary.healthy += 1;
        } else {
            summary.unhealthy += 1;
        }
    }

    tracing::debug!(
        probed = summary.probed,
        healthy = summary.healthy,
        unhealthy = summary.unhealthy,
        "Health sweep complete"
    );
    summary
}
