//! Dispatch error taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Why a dispatch attempt (or a whole dispatch) did not succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// No candidate passed eligibility, fallback pool included. Never retried.
    #[error("no eligible endpoint for category {category}")]
    NoEligibleEndpoint { category: String },

    /// The executor returned an error.
    #[error("downstream call failed: {0}")]
    DownstreamCallFailure(String),

    /// The executor did not finish within the rule's deadline.
    #[error("downstream call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The caller gave up while the call was in flight. Never retried.
    #[error("dispatch cancelled by caller")]
    Cancelled,
}

/// Flat, serialisable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoEligibleEndpoint,
    DownstreamCallFailure,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoEligibleEndpoint => "no_eligible_endpoint",
            ErrorKind::DownstreamCallFailure => "downstream_call_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NoEligibleEndpoint { .. } => ErrorKind::NoEligibleEndpoint,
            DispatchError::DownstreamCallFailure(_) => ErrorKind::DownstreamCallFailure,
            DispatchError::Timeout { .. } => ErrorKind::Timeout,
            DispatchError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether another attempt may follow this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::DownstreamCallFailure(_) | DispatchError::Timeout { .. }
        )
    }
}
