//! Downstream call executor.
//!
//! # Responsibilities
//! - Perform the actual call to a selected endpoint
//! - Report application-level failures as `ExecutorError`
//!
//! # Design Decisions
//! - The dispatcher owns the deadline; executors may ignore `timeout`
//! - Any 2xx response is a success; the body is returned as JSON when it parses

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::dispatch::request::DispatchRequest;
use crate::registry::EndpointSnapshot;

const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// Errors reported by an executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("backend returned status {status}")]
    Status { status: u16 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Performs the network call to a backend endpoint.
#[async_trait]
pub trait DownstreamExecutor: Send + Sync {
    async fn execute(
        &self,
        endpoint: &EndpointSnapshot,
        request: &DispatchRequest,
        timeout: Duration,
    ) -> Result<Value, ExecutorError>;
}

/// POSTs the request as JSON to the endpoint address.
///
/// `credential_ref`, when set, is sent as a bearer token.
pub struct HttpExecutor {
    client: Client<HttpConnector, Body>,
}

impl HttpExecutor {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownstreamExecutor for HttpExecutor {
    async fn execute(
        &self,
        endpoint: &EndpointSnapshot,
        request: &DispatchRequest,
        _timeout: Duration,
    ) -> Result<Value, ExecutorError> {
        let url = Url::parse(&endpoint.address)
            .map_err(|e| ExecutorError::InvalidRequest(e.to_string()))?;

        let body = serde_json::to_vec(&json!({
            "request_id": request.request_id,
            "category": request.category,
            "payload": request.payload,
        }))
        .map_err(|e| ExecutorError::InvalidRequest(e.to_string()))?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", request.request_id.as_str());
        if let Some(credential) = &endpoint.credential_ref {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", credential));
        }
        let req = builder
            .body(Body::from(body))
            .map_err(|e| ExecutorError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| ExecutorError::Connection(e.to_string()))?;

        let status = response.status();
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| ExecutorError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(
                endpoint = %endpoint.id,
                status = %status,
                "Backend returned non-success status"
            );
            return Err(ExecutorError::Status {
                status: status.as_u16(),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())))
    }
}
