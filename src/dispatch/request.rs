//! Request descriptor handed to the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::registry::ServiceType;

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// An already-validated logical request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    #[serde(default = "new_request_id")]
    pub request_id: String,

    /// Request intent, used for rule lookup and intent affinity.
    pub category: String,

    /// Caller-estimated fit in [0, 1]; the scoring default applies when absent.
    #[serde(default)]
    pub compatibility_score: Option<f64>,

    /// Service type preferred when the category has no configured rule.
    #[serde(default)]
    pub target_service_type: Option<ServiceType>,

    /// Opaque body forwarded to the backend.
    #[serde(default)]
    pub payload: Value,
}

impl DispatchRequest {
    /// Create a request with a fresh id and an empty payload.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            request_id: new_request_id(),
            category: category.into(),
            compatibility_score: None,
            target_service_type: None,
            payload: Value::Null,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn with_target(mut self, service_type: impl Into<ServiceType>) -> Self {
        self.target_service_type = Some(service_type.into());
        self
    }

    /// Set the compatibility score, clamped to [0, 1].
    #[must_use]
    pub fn with_compatibility(mut self, score: f64) -> Self {
        self.compatibility_score = Some(score.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
