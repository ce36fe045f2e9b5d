//! Request dispatch orchestration.
//!
//! # Responsibilities
//! - Look up the routing rule for a request
//! - Gather eligible candidates and select an endpoint
//! - Execute the downstream call under the rule's deadline
//! - Release load and record telemetry on every exit path
//! - Retry failed attempts within the rule's retry budget
//! - Decorate results with strategy metadata

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::{json, Map, Value};
use tokio::time::Instant;

use crate::config::{EngineConfig, RetryConfig};
use crate::dispatch::error::DispatchError;
use crate::dispatch::executor::DownstreamExecutor;
use crate::dispatch::in_flight::InFlight;
use crate::dispatch::request::DispatchRequest;
use crate::dispatch::result::{DispatchStatus, RoutingResult};
use crate::history::MetricsRecorder;
use crate::observability::metrics;
use crate::registry::{EndpointId, EndpointRegistry, EndpointSnapshot};
use crate::resilience::backoff::retry_delay;
use crate::routing::rules::{RoutingRule, RoutingRuleTable, Strategy};
use crate::routing::strategy::StrategySelector;

/// Routes requests to endpoints. Shared across concurrent callers.
pub struct Dispatcher {
    registry: Arc<EndpointRegistry>,
    rules: ArcSwap<RoutingRuleTable>,
    selector: StrategySelector,
    recorder: Arc<MetricsRecorder>,
    executor: Arc<dyn DownstreamExecutor>,
    retry: RetryConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        rules: RoutingRuleTable,
        recorder: Arc<MetricsRecorder>,
        executor: Arc<dyn DownstreamExecutor>,
        retry: RetryConfig,
    ) -> Self {
        let selector = StrategySelector::new(registry.scoring().clone());
        Self {
            registry,
            rules: ArcSwap::from_pointee(rules),
            selector,
            recorder,
            executor,
            retry,
        }
    }

    /// Build a dispatcher whose rule table and retry policy come from `config`.
    pub fn from_config(
        config: &EngineConfig,
        registry: Arc<EndpointRegistry>,
        recorder: Arc<MetricsRecorder>,
        executor: Arc<dyn DownstreamExecutor>,
    ) -> Self {
        let rules = RoutingRuleTable::new(&config.rules, config.default_rule.clone());
        Self::new(registry, rules, recorder, executor, config.retries.clone())
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    /// Current rule table.
    pub fn rules(&self) -> Arc<RoutingRuleTable> {
        self.rules.load_full()
    }

    /// Atomically replace the rule table. In-flight dispatches keep the rule
    /// they started with.
    pub fn reload_rules(&self, rules: RoutingRuleTable) {
        tracing::info!(rules = rules.len(), "Routing rules reloaded");
        self.rules.store(Arc::new(rules));
    }

    /// Route a request and execute it.
    pub async fn route(&self, request: &DispatchRequest) -> RoutingResult {
        self.route_until(request, std::future::pending()).await
    }

    /// Route a request, aborting the in-flight call when `cancel` resolves.
    ///
    /// A cancelled dispatch still releases its load and records a failed
    /// attempt; it is not retried.
    pub async fn route_until<C>(&self, request: &DispatchRequest, cancel: C) -> RoutingResult
    where
        C: Future<Output = ()>,
    {
        let started = Instant::now();
        let rule = self.rules.load().lookup(request);
        tokio::pin!(cancel);

        tracing::debug!(
            request_id = %request.request_id,
            category = %request.category,
            strategy = %rule.strategy,
            "Routing request"
        );

        let mut attempt: u32 = 0;
        let mut last_failure: Option<(EndpointId, DispatchError)> = None;

        loop {
            let candidates = self.registry.candidates(&rule.preferred_service_types);
            let endpoint = match self.selector.select(rule.strategy, &candidates, request) {
                Ok(endpoint) => endpoint,
                Err(err) => {
                    return match last_failure {
                        Some((endpoint_id, last_err)) => {
                            tracing::warn!(
                                request_id = %request.request_id,
                                attempts = attempt,
                                "No eligible endpoint left to retry on"
                            );
                            failure(request, &rule, Some(endpoint_id), attempt, started, last_err)
                        }
                        None => {
                            tracing::warn!(
                                request_id = %request.request_id,
                                category = %request.category,
                                preferred = ?rule.preferred_service_types,
                                "No eligible endpoint"
                            );
                            metrics::record_no_endpoint(&request.category);
                            failure(request, &rule, None, 0, started, err)
                        }
                    };
                }
            };

            attempt += 1;
            match self
                .attempt(&rule, &endpoint, request, attempt, cancel.as_mut())
                .await
            {
                Ok(response) => {
                    return success(request, &rule, &endpoint, attempt, started, response);
                }
                Err(err) => {
                    if !err.is_retryable() || attempt > rule.retry_count {
                        return failure(request, &rule, Some(endpoint.id), attempt, started, err);
                    }

                    metrics::record_retry(&request.category);
                    let delay = retry_delay(attempt, &self.retry);
                    tracing::info!(
                        request_id = %request.request_id,
                        attempt = attempt,
                        remaining = rule.retry_count + 1 - attempt,
                        delay = ?delay,
                        "Retrying dispatch"
                    );
                    if !delay.is_zero() {
                        tokio::select! {
                            biased;
                            _ = cancel.as_mut() => {
                                return failure(
                                    request,
                                    &rule,
                                    Some(endpoint.id),
                                    attempt,
                                    started,
                                    DispatchError::Cancelled,
                                );
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    last_failure = Some((endpoint.id, err));
                }
            }
        }
    }

    /// One load-tracked downstream call.
    async fn attempt<C>(
        &self,
        rule: &RoutingRule,
        endpoint: &EndpointSnapshot,
        request: &DispatchRequest,
        attempt: u32,
        cancel: Pin<&mut C>,
    ) -> Result<Value, DispatchError>
    where
        C: Future<Output = ()>,
    {
        let in_flight = InFlight::begin(
            &self.registry,
            &self.recorder,
            endpoint.id.clone(),
            &request.request_id,
            &request.category,
            rule.strategy,
            attempt,
        );

        let timeout = rule.timeout();
        let call = self.executor.execute(endpoint, request, timeout);
        let outcome = tokio::select! {
            biased;
            _ = cancel => Err(DispatchError::Cancelled),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(DispatchError::DownstreamCallFailure(e.to_string())),
                Err(_) => Err(DispatchError::Timeout { timeout_ms: rule.timeout_ms }),
            },
        };

        let latency_ms = in_flight.finish(outcome.as_ref().err());
        if let Err(err) = &outcome {
            tracing::warn!(
                request_id = %request.request_id,
                endpoint = %endpoint.id,
                attempt = attempt,
                latency_ms = latency_ms,
                error = %err,
                "Dispatch attempt failed"
            );
        }
        outcome
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Strategy metadata attached to successful results.
fn decorate(rule: &RoutingRule, endpoint: &EndpointSnapshot) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("routing_strategy".into(), json!(rule.strategy.as_str()));
    metadata.insert(
        "selected_endpoint".into(),
        json!({
            "service_type": endpoint.service_type,
            "health_score": endpoint.health_score,
            "load_factor": endpoint.load_factor(),
        }),
    );
    match rule.strategy {
        Strategy::Batch => {
            metadata.insert("batch_size".into(), json!(rule.batch_size));
        }
        Strategy::Streaming => {
            metadata.insert("streaming_enabled".into(), json!(true));
        }
        Strategy::Direct | Strategy::LoadBalanced | Strategy::Failover | Strategy::Adaptive => {}
    }
    metadata
}

fn success(
    request: &DispatchRequest,
    rule: &RoutingRule,
    endpoint: &EndpointSnapshot,
    attempts: u32,
    started: Instant,
    response: Value,
) -> RoutingResult {
    RoutingResult {
        request_id: request.request_id.clone(),
        category: request.category.clone(),
        status: DispatchStatus::Success,
        selected_endpoint_id: Some(endpoint.id.clone()),
        strategy: rule.strategy,
        latency_ms: elapsed_ms(started),
        attempts,
        error: None,
        metadata: decorate(rule, endpoint),
        response: Some(response),
    }
}

fn failure(
    request: &DispatchRequest,
    rule: &RoutingRule,
    endpoint_id: Option<EndpointId>,
    attempts: u32,
    started: Instant,
    error: DispatchError,
) -> RoutingResult {
    let mut metadata = Map::new();
    metadata.insert("routing_strategy".into(), json!(rule.strategy.as_str()));
    RoutingResult {
        request_id: request.request_id.clone(),
        category: request.category.clone(),
        status: DispatchStatus::Error,
        selected_endpoint_id: endpoint_id,
        strategy: rule.strategy,
        latency_ms: elapsed_ms(started),
        attempts,
        error: Some(error),
        metadata,
        response: None,
    }
}
