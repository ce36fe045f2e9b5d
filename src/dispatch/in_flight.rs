//! Load accounting and outcome recording for one dispatch attempt.

use tokio::time::Instant;

use std::sync::Arc;

use crate::dispatch::error::{DispatchError, ErrorKind};
use crate::history::{ExecutionRecord, MetricsRecorder};
use crate::observability::metrics;
use crate::registry::{Endpoint, EndpointId, EndpointRegistry};
use crate::routing::rules::Strategy;

/// A RAII guard around one downstream call.
///
/// Creating it takes one unit of load on the endpoint. Dropping it releases
/// that load, feeds the outcome into the endpoint telemetry and appends an
/// execution record. A guard dropped before `finish` (the dispatch future was
/// dropped mid-call) counts as a cancelled, failed attempt.
///
/// The guard holds the endpoint it acquired, so an id that is deregistered
/// and registered again mid-call never sees this attempt's load or outcome.
pub(crate) struct InFlight<'a> {
    registry: &'a EndpointRegistry,
    /// None when the endpoint was deregistered after selection.
    endpoint: Option<Arc<Endpoint>>,
    recorder: &'a MetricsRecorder,
    endpoint_id: EndpointId,
    request_id: &'a str,
    category: &'a str,
    strategy: Strategy,
    attempt: u32,
    started: Instant,
    /// Error kind (None on success) and latency, once settled.
    outcome: Option<(Option<ErrorKind>, f64)>,
}

impl<'a> InFlight<'a> {
    pub(crate) fn begin(
        registry: &'a EndpointRegistry,
        recorder: &'a MetricsRecorder,
        endpoint_id: EndpointId,
        request_id: &'a str,
        category: &'a str,
        strategy: Strategy,
        attempt: u32,
    ) -> Self {
        let endpoint = registry.get(endpoint_id.as_str());
        match &endpoint {
            Some(endpoint) => {
                endpoint.increment_load();
                metrics::record_endpoint_state(&endpoint.snapshot());
            }
            None => tracing::debug!(
                request_id = %request_id,
                endpoint = %endpoint_id,
                "Endpoint deregistered after selection"
            ),
        }
        Self {
            registry,
            endpoint,
            recorder,
            endpoint_id,
            request_id,
            category,
            strategy,
            attempt,
            started: Instant::now(),
            outcome: None,
        }
    }

    /// Settle the attempt. Returns the attempt latency in milliseconds.
    pub(crate) fn finish(mut self, error: Option<&DispatchError>) -> f64 {
        let latency_ms = elapsed_ms(self.started);
        self.outcome = Some((error.map(DispatchError::kind), latency_ms));
        latency_ms
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let id = self.endpoint_id.as_str();

        let (error_kind, latency_ms) = match self.outcome.take() {
            Some(settled) => settled,
            None => {
                tracing::warn!(
                    request_id = %self.request_id,
                    endpoint = %id,
                    "Dispatch dropped while the downstream call was in flight"
                );
                (Some(ErrorKind::Cancelled), elapsed_ms(self.started))
            }
        };
        let success = error_kind.is_none();

        if let Some(endpoint) = &self.endpoint {
            endpoint.decrement_load();
            endpoint.record_outcome(latency_ms, success, self.registry.scoring());
            metrics::record_endpoint_state(&endpoint.snapshot());
        }

        let record = ExecutionRecord::new(
            self.request_id,
            self.category,
            self.endpoint_id.clone(),
            self.strategy,
            error_kind,
            self.attempt,
            latency_ms,
        );
        metrics::record_attempt(self.strategy, &self.endpoint_id, record.status, latency_ms);
        self.recorder.append(record);
    }
}
