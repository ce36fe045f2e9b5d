//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch metrics (attempts, latency, retries, unroutable requests)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-endpoint health and load
//!
//! # Metrics
//! - `dispatch_attempts_total` (counter): attempts by strategy, endpoint, status
//! - `dispatch_attempt_duration_seconds` (histogram): attempt latency by strategy
//! - `dispatch_no_endpoint_total` (counter): dispatches with no eligible endpoint
//! - `dispatch_retries_total` (counter): retries by category
//! - `endpoint_health_score` (gauge): current health score per endpoint
//! - `endpoint_current_load` (gauge): in-flight requests per endpoint
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for strategy, endpoint, status

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::dispatch::DispatchStatus;
use crate::registry::{EndpointId, EndpointSnapshot};
use crate::routing::rules::Strategy;

/// Start the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record one finished dispatch attempt.
pub fn record_attempt(
    strategy: Strategy,
    endpoint: &EndpointId,
    status: DispatchStatus,
    latency_ms: f64,
) {
    counter!(
        "dispatch_attempts_total",
        "strategy" => strategy.as_str(),
        "endpoint" => endpoint.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
    histogram!("dispatch_attempt_duration_seconds", "strategy" => strategy.as_str())
        .record(latency_ms / 1000.0);
}

/// Record a dispatch that found no eligible endpoint.
pub fn record_no_endpoint(category: &str) {
    counter!("dispatch_no_endpoint_total", "category" => category.to_string()).increment(1);
}

/// Record a retry.
pub fn record_retry(category: &str) {
    counter!("dispatch_retries_total", "category" => category.to_string()).increment(1);
}

/// Publish an endpoint's health and load.
pub fn record_endpoint_state(endpoint: &EndpointSnapshot) {
    gauge!("endpoint_health_score", "endpoint" => endpoint.id.to_string())
        .set(endpoint.health_score);
    gauge!("endpoint_current_load", "endpoint" => endpoint.id.to_string())
        .set(endpoint.current_load as f64);
}
