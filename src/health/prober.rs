//! Health probe implementations.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time;

use crate::config::{HealthCheckConfig, ProbeMode};
use crate::registry::EndpointSnapshot;

/// Why a probe reported an endpoint as unhealthy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("probe request invalid: {0}")]
    InvalidRequest(String),

    #[error("probe connection failed: {0}")]
    Connection(String),

    #[error("probe returned status {status}")]
    Status { status: u16 },

    #[error("probe timed out")]
    Timeout,
}

/// Checks whether an endpoint is alive.
#[async_trait]
pub trait HealthProber: Send + Sync {
    async fn probe(&self, endpoint: &EndpointSnapshot) -> Result<(), ProbeError>;
}

/// Reports every endpoint as healthy.
///
/// Each sweep then nudges health back up by the recovery step, the same
/// optimistic recovery the engine has always applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeHealthy;

#[async_trait]
impl HealthProber for AssumeHealthy {
    async fn probe(&self, _endpoint: &EndpointSnapshot) -> Result<(), ProbeError> {
        Ok(())
    }
}

/// GETs `address + path`; any 2xx is healthy.
pub struct HttpProber {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            path: path.into(),
            timeout,
        }
    }

    fn probe_uri(&self, address: &str) -> String {
        format!(
            "{}/{}",
            address.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl HealthProber for HttpProber {
    async fn probe(&self, endpoint: &EndpointSnapshot) -> Result<(), ProbeError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.probe_uri(&endpoint.address))
            .header(header::USER_AGENT, "dispatch-engine-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeError::InvalidRequest(e.to_string()))?;

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(ProbeError::Status {
                status: response.status().as_u16(),
            }),
            Ok(Err(e)) => Err(ProbeError::Connection(e.to_string())),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

/// Build the prober selected by configuration.
pub fn from_config(config: &HealthCheckConfig) -> Box<dyn HealthProber> {
    match config.probe {
        ProbeMode::AssumeHealthy => Box::new(AssumeHealthy),
        ProbeMode::Http => Box::new(HttpProber::new(
            config.path.clone(),
            Duration::from_secs(config.timeout_secs),
        )),
    }
}
