//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dispatch_engine::config::{
    DefaultRuleConfig, EndpointConfig, RetryConfig, RuleConfig, ScoringConfig,
};
use dispatch_engine::dispatch::{
    DispatchRequest, Dispatcher, DownstreamExecutor, ExecutorError,
};
use dispatch_engine::health::{HealthProber, ProbeError};
use dispatch_engine::history::MetricsRecorder;
use dispatch_engine::registry::{EndpointId, EndpointRegistry, EndpointSnapshot};
use dispatch_engine::routing::{RoutingRuleTable, Strategy};

/// What a scripted executor does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed,
    Fail,
    /// Sleep, then succeed.
    Delay(Duration),
    /// Never complete.
    Hang,
}

/// Executor whose behaviour is chosen per call.
pub struct ScriptedExecutor {
    script: Box<dyn Fn(&EndpointSnapshot, u32) -> Step + Send + Sync>,
    calls: AtomicU32,
    log: Mutex<Vec<EndpointId>>,
}

impl ScriptedExecutor {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&EndpointSnapshot, u32) -> Step + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicU32::new(0),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new(move |_, _| step.clone())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Endpoints called, in call order.
    pub fn called(&self) -> Vec<EndpointId> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl DownstreamExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        endpoint: &EndpointSnapshot,
        _request: &DispatchRequest,
        _timeout: Duration,
    ) -> Result<Value, ExecutorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(endpoint.id.clone());

        match (self.script)(endpoint, n) {
            Step::Succeed => Ok(json!({ "served_by": endpoint.id })),
            Step::Fail => Err(ExecutorError::Status { status: 503 }),
            Step::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(json!({ "served_by": endpoint.id }))
            }
            Step::Hang => std::future::pending().await,
        }
    }
}

/// Prober reporting a fixed verdict for every endpoint.
pub struct FixedProber(pub bool);

#[async_trait]
impl HealthProber for FixedProber {
    async fn probe(&self, _endpoint: &EndpointSnapshot) -> Result<(), ProbeError> {
        if self.0 {
            Ok(())
        } else {
            Err(ProbeError::Connection("refused".into()))
        }
    }
}

pub fn endpoint(id: &str, service_type: &str, max_load: u32) -> EndpointConfig {
    EndpointConfig {
        id: Some(id.into()),
        service_type: service_type.into(),
        address: format!("http://{}.invalid", id),
        credential_ref: None,
        max_load,
    }
}

pub fn rule(
    category: &str,
    strategy: Strategy,
    preferred: &[&str],
    timeout_ms: u64,
    retry_count: u32,
) -> RuleConfig {
    RuleConfig {
        category: category.into(),
        strategy,
        preferred_service_types: preferred.iter().map(|s| s.to_string()).collect(),
        timeout_ms,
        retry_count,
        batch_size: None,
    }
}

/// Dispatcher over the given endpoints and rules with immediate retries.
pub fn dispatcher(
    endpoints: &[EndpointConfig],
    rules: &[RuleConfig],
    executor: Arc<dyn DownstreamExecutor>,
) -> Dispatcher {
    let registry = Arc::new(
        EndpointRegistry::from_config(endpoints, ScoringConfig::default())
            .expect("test endpoints have unique ids"),
    );
    Dispatcher::new(
        registry,
        RoutingRuleTable::new(rules, DefaultRuleConfig::default()),
        Arc::new(MetricsRecorder::new(1000)),
        executor,
        RetryConfig::default(),
    )
}

/// Assert the telemetry bounds every endpoint must respect.
pub fn assert_invariants(registry: &EndpointRegistry) {
    for s in registry.all() {
        assert!(
            (0.0..=1.0).contains(&s.health_score),
            "{} health out of range: {}",
            s.id,
            s.health_score
        );
        assert!(
            (0.0..=1.0).contains(&s.success_rate),
            "{} success rate out of range: {}",
            s.id,
            s.success_rate
        );
    }
}

/// Start a programmable HTTP backend on an ephemeral port. Returns its base URL.
pub async fn start_programmable_backend<F, Fut>(f: F) -> String
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 8192];
                        let _ = socket.read(&mut buf).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{}", addr)
}
