//! Behavioural properties of the dispatcher.

use std::time::Duration;

use dispatch_engine::dispatch::{DispatchRequest, DispatchStatus, ErrorKind};
use dispatch_engine::health::sweep;
use dispatch_engine::registry::{Endpoint, EndpointId};
use dispatch_engine::routing::Strategy;

mod common;
use common::{assert_invariants, dispatcher, endpoint, rule, FixedProber, ScriptedExecutor, Step};

#[tokio::test]
async fn test_load_balanced_picks_least_loaded() {
    let executor = ScriptedExecutor::always(Step::Succeed);
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10), endpoint("e2", "gpt-4o", 10)],
        &[rule("refactor", Strategy::LoadBalanced, &["gpt-4o"], 1000, 0)],
        executor.clone(),
    );
    for _ in 0..5 {
        d.registry().increment_load("e2");
    }

    for _ in 0..10 {
        let result = d.route(&DispatchRequest::new("refactor")).await;
        assert_eq!(result.selected_endpoint_id, Some("e1".into()));
    }
    assert_eq!(d.registry().snapshot("e2").unwrap().current_load, 5);
}

#[tokio::test]
async fn test_failover_picks_healthiest() {
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10), endpoint("e2", "gpt-4o", 10)],
        &[rule("debug", Strategy::Failover, &["gpt-4o"], 1000, 0)],
        ScriptedExecutor::always(Step::Succeed),
    );
    // e1 → 0.9, e2 → 0.95
    d.registry().update_metrics("e1", 10.0, false);
    d.registry().update_metrics("e1", 10.0, false);
    d.registry().update_metrics("e2", 10.0, false);

    for _ in 0..10 {
        let result = d.route(&DispatchRequest::new("debug")).await;
        assert_eq!(result.selected_endpoint_id, Some("e2".into()));
    }
}

#[tokio::test]
async fn test_adaptive_selection_is_deterministic() {
    let endpoints = [
        endpoint("gpt", "gpt-4o", 10),
        endpoint("copilot", "github-copilot", 10),
        endpoint("claude", "claude-3", 10),
    ];
    let rules = [rule(
        "debug",
        Strategy::Adaptive,
        &["gpt-4o", "github-copilot", "claude-3"],
        1000,
        0,
    )];
    let request = DispatchRequest::new("debug")
        .with_request_id("fixed")
        .with_compatibility(0.6);

    let mut selections = Vec::new();
    for _ in 0..3 {
        let d = dispatcher(&endpoints, &rules, ScriptedExecutor::always(Step::Succeed));
        selections.push(d.route(&request).await.selected_endpoint_id);
    }
    // Debug intent favours github-copilot.
    assert_eq!(selections, vec![Some(EndpointId::from("copilot")); 3]);
}

#[tokio::test]
async fn test_load_released_on_success() {
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("analyze", Strategy::Direct, &["gpt-4o"], 5000, 0)],
        ScriptedExecutor::always(Step::Delay(Duration::from_millis(50))),
    );

    let request = DispatchRequest::new("analyze");
    let (result, load_during) = tokio::join!(d.route(&request), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        d.registry().snapshot("e1").unwrap().current_load
    });

    assert!(result.is_success());
    assert_eq!(load_during, 1);
    assert_eq!(d.registry().snapshot("e1").unwrap().current_load, 0);
}

#[tokio::test]
async fn test_load_released_on_failure() {
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("analyze", Strategy::Direct, &["gpt-4o"], 1000, 1)],
        ScriptedExecutor::always(Step::Fail),
    );
    d.registry().increment_load("e1");

    let result = d.route(&DispatchRequest::new("analyze")).await;
    assert_eq!(result.status, DispatchStatus::Error);
    assert_eq!(d.registry().snapshot("e1").unwrap().current_load, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_releases_load_and_records_failure() {
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("optimize", Strategy::Streaming, &["gpt-4o"], 1000, 0)],
        ScriptedExecutor::always(Step::Hang),
    );

    let result = d.route(&DispatchRequest::new("optimize")).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(result.attempts, 1);
    assert!(result.latency_ms >= 1000.0);
    assert!(result.metadata.get("streaming_enabled").is_none());

    let snapshot = d.registry().snapshot("e1").unwrap();
    assert_eq!(snapshot.current_load, 0);
    assert!((snapshot.success_rate - 0.95).abs() < 1e-9);

    let records = d.recorder().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_kind, Some(ErrorKind::Timeout));
    assert!(records[0].latency_ms >= 1000.0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_releases_load_without_retry() {
    let executor = ScriptedExecutor::always(Step::Hang);
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("security", Strategy::Direct, &["gpt-4o"], 60_000, 3)],
        executor.clone(),
    );

    let result = d
        .route_until(
            &DispatchRequest::new("security"),
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    assert_eq!(result.attempts, 1);
    assert_eq!(executor.calls(), 1);
    assert_eq!(d.registry().snapshot("e1").unwrap().current_load, 0);
    assert_eq!(d.recorder().records()[0].error_kind, Some(ErrorKind::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_dispatch_releases_load() {
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("security", Strategy::Direct, &["gpt-4o"], 60_000, 3)],
        ScriptedExecutor::always(Step::Hang),
    );

    let request = DispatchRequest::new("security");
    let outcome = tokio::time::timeout(Duration::from_millis(100), d.route(&request)).await;
    assert!(outcome.is_err());

    let snapshot = d.registry().snapshot("e1").unwrap();
    assert_eq!(snapshot.current_load, 0);
    assert!((snapshot.success_rate - 0.95).abs() < 1e-9);

    let records = d.recorder().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_kind, Some(ErrorKind::Cancelled));
}

#[tokio::test]
async fn test_monotonic_degradation_and_recovery() {
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 20)],
        &[rule("debug", Strategy::Direct, &["gpt-4o"], 1000, 0)],
        ScriptedExecutor::always(Step::Fail),
    );
    // One unit of load held elsewhere for the whole run: load factor 0.05.
    d.registry().increment_load("e1");

    for _ in 0..10 {
        let result = d.route(&DispatchRequest::new("debug")).await;
        assert_eq!(result.selected_endpoint_id, Some("e1".into()));
        assert_invariants(d.registry());
    }

    let snapshot = d.registry().snapshot("e1").unwrap();
    assert!((snapshot.success_rate - 0.5).abs() < 1e-9);
    assert!(snapshot.health_score < 0.5);
    assert!(d.registry().candidates(&["gpt-4o".into()]).is_empty());

    let result = d.route(&DispatchRequest::new("debug")).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::NoEligibleEndpoint));

    sweep(d.registry(), &FixedProber(true), Duration::from_secs(1)).await;
    assert_eq!(d.registry().candidates(&["gpt-4o".into()]).len(), 1);
}

#[tokio::test]
async fn test_no_candidates_touches_nothing() {
    let executor = ScriptedExecutor::always(Step::Succeed);
    let d = dispatcher(&[], &[], executor.clone());

    let result = d.route(&DispatchRequest::new("security")).await;

    assert_eq!(result.status, DispatchStatus::Error);
    assert_eq!(result.error_kind(), Some(ErrorKind::NoEligibleEndpoint));
    assert_eq!(result.attempts, 0);
    assert_eq!(result.selected_endpoint_id, None);
    assert_eq!(executor.calls(), 0);
    assert!(d.recorder().is_empty());
}

#[tokio::test]
async fn test_saturated_endpoints_are_not_candidates() {
    let executor = ScriptedExecutor::always(Step::Succeed);
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 1)],
        &[rule("refactor", Strategy::LoadBalanced, &["gpt-4o"], 1000, 2)],
        executor.clone(),
    );
    d.registry().increment_load("e1");

    let result = d.route(&DispatchRequest::new("refactor")).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::NoEligibleEndpoint));
    assert_eq!(executor.calls(), 0);
    assert_eq!(d.registry().snapshot("e1").unwrap().current_load, 1);
}

#[tokio::test]
async fn test_retry_exhaustion_makes_three_attempts() {
    let executor = ScriptedExecutor::always(Step::Fail);
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("debug", Strategy::Failover, &["gpt-4o"], 1000, 2)],
        executor.clone(),
    );

    let result = d.route(&DispatchRequest::new("debug")).await;

    assert_eq!(result.status, DispatchStatus::Error);
    assert_eq!(result.error_kind(), Some(ErrorKind::DownstreamCallFailure));
    assert_eq!(result.attempts, 3);
    assert_eq!(executor.calls(), 3);

    let attempts: Vec<u32> = d.recorder().records().iter().map(|r| r.attempt).collect();
    assert_eq!(attempts, vec![1, 2, 3]);
    assert_eq!(d.registry().snapshot("e1").unwrap().current_load, 0);
}

#[tokio::test]
async fn test_retry_reselects_after_failure() {
    // e1 fails once; the retry should move to the now-healthier e2.
    let executor = ScriptedExecutor::new(|endpoint, _| {
        if endpoint.id.as_str() == "e1" {
            Step::Fail
        } else {
            Step::Succeed
        }
    });
    let d = dispatcher(
        &[endpoint("e1", "gpt-4o", 10), endpoint("e2", "gpt-4o", 10)],
        &[rule("debug", Strategy::Failover, &["gpt-4o"], 1000, 2)],
        executor.clone(),
    );

    let result = d.route(&DispatchRequest::new("debug")).await;

    assert!(result.is_success());
    assert_eq!(result.attempts, 2);
    assert_eq!(result.selected_endpoint_id, Some("e2".into()));
    assert_eq!(executor.called(), vec![EndpointId::from("e1"), EndpointId::from("e2")]);
}

#[tokio::test]
async fn test_fallback_pool_when_preferred_types_missing() {
    let d = dispatcher(
        &[endpoint("claude", "claude-3", 10)],
        &[rule("generate", Strategy::Batch, &["github-copilot", "gpt-4o"], 1000, 0)],
        ScriptedExecutor::always(Step::Succeed),
    );

    let result = d.route(&DispatchRequest::new("generate")).await;

    assert!(result.is_success());
    assert_eq!(result.selected_endpoint_id, Some("claude".into()));
    assert_eq!(result.metadata["routing_strategy"], "batch");
    assert_eq!(result.metadata["batch_size"], 5);
}

#[tokio::test(start_paused = true)]
async fn test_reregistered_id_is_isolated_from_calls_on_its_predecessor() {
    let executor = ScriptedExecutor::new(|_, n| match n {
        0 => Step::Delay(Duration::from_millis(100)),
        _ => Step::Delay(Duration::from_millis(1000)),
    });
    let d = std::sync::Arc::new(dispatcher(
        &[endpoint("e1", "gpt-4o", 10)],
        &[rule("refactor", Strategy::LoadBalanced, &["gpt-4o"], 5000, 0)],
        executor.clone(),
    ));

    let first = tokio::spawn({
        let d = d.clone();
        async move { d.route(&DispatchRequest::new("refactor")).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(d.registry().snapshot("e1").unwrap().current_load, 1);

    assert!(d.registry().deregister("e1"));
    d.registry()
        .register(Endpoint::from_config(&endpoint("e1", "gpt-4o", 10)))
        .unwrap();
    let fresh = d.registry().snapshot("e1").unwrap();

    let second = tokio::spawn({
        let d = d.clone();
        async move { d.route(&DispatchRequest::new("refactor")).await }
    });
    tokio::time::sleep(Duration::from_millis(490)).await;

    // The first call has settled; only the second runs on the new e1.
    assert!(first.await.unwrap().is_success());
    let during = d.registry().snapshot("e1").unwrap();
    assert_eq!(during.current_load, 1);
    assert_eq!(during.success_rate, fresh.success_rate);
    assert_eq!(during.avg_response_time_ms, fresh.avg_response_time_ms);

    assert!(second.await.unwrap().is_success());
    let after = d.registry().snapshot("e1").unwrap();
    assert_eq!(after.current_load, 0);
    assert!(after.avg_response_time_ms >= 1000.0);
    assert_invariants(d.registry());
}
