//! Execution records.

use std::time::SystemTime;

use serde::Serialize;

use crate::dispatch::{DispatchStatus, ErrorKind};
use crate::registry::{unix_millis, EndpointId};
use crate::routing::rules::Strategy;

/// Immutable log entry for one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub request_id: String,
    pub category: String,
    pub selected_endpoint_id: EndpointId,
    pub strategy: Strategy,
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// 1-based attempt number within the dispatch.
    pub attempt: u32,
    pub latency_ms: f64,
    pub timestamp_ms: u64,
}

impl ExecutionRecord {
    /// Record stamped with the current time.
    pub fn new(
        request_id: impl Into<String>,
        category: impl Into<String>,
        selected_endpoint_id: EndpointId,
        strategy: Strategy,
        error_kind: Option<ErrorKind>,
        attempt: u32,
        latency_ms: f64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            category: category.into(),
            selected_endpoint_id,
            strategy,
            status: if error_kind.is_none() {
                DispatchStatus::Success
            } else {
                DispatchStatus::Error
            },
            error_kind,
            attempt,
            latency_ms,
            timestamp_ms: unix_millis(SystemTime::now()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Success
    }
}
