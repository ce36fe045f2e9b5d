//! Routing decision plus execution outcome.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::dispatch::error::{DispatchError, ErrorKind};
use crate::registry::EndpointId;
use crate::routing::rules::Strategy;

/// Outcome of one attempt or of a whole dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Success,
    Error,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Success => "success",
            DispatchStatus::Error => "error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

fn serialize_error<S: Serializer>(
    error: &Option<DispatchError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => ErrorBody {
            kind: e.kind(),
            message: e.to_string(),
        }
        .serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// What `Dispatcher::route` returns. Every outcome is a value, never a panic
/// or an `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingResult {
    pub request_id: String,
    pub category: String,
    pub status: DispatchStatus,
    /// Endpoint of the last attempt, if any attempt was made.
    pub selected_endpoint_id: Option<EndpointId>,
    pub strategy: Strategy,
    /// Total wall time, retries included.
    pub latency_ms: f64,
    /// Downstream calls made.
    pub attempts: u32,
    #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchError>,
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl RoutingResult {
    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(DispatchError::kind)
    }
}
