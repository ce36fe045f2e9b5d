//! Adaptive endpoint scoring.
//!
//! ```text
//! score = health * w_health
//!       + (1 - load_factor) * w_load
//!       + compatibility * w_compat
//!       + intent_bonus
//!       + response_time_factor * w_rt
//! ```
//!
//! Capped at 1.0 from above only.

use crate::config::ScoringConfig;
use crate::dispatch::DispatchRequest;
use crate::registry::{EndpointSnapshot, ServiceType};

/// Bonus when the category has a configured affinity with the service type.
pub fn intent_bonus(scoring: &ScoringConfig, category: &str, service_type: &ServiceType) -> f64 {
    let favoured = scoring
        .intent_affinity
        .get(category)
        .is_some_and(|types| types.iter().any(|t| t == service_type.as_str()));
    if favoured {
        scoring.intent_bonus
    } else {
        0.0
    }
}

/// 1 for an instant response, falling linearly to 0 at the reference latency.
pub fn response_time_factor(scoring: &ScoringConfig, avg_response_time_ms: f64) -> f64 {
    (1.0 - avg_response_time_ms / scoring.response_time_reference_ms).max(0.0)
}

/// Composite score of an endpoint for a request.
pub fn adaptive_score(
    scoring: &ScoringConfig,
    endpoint: &EndpointSnapshot,
    request: &DispatchRequest,
) -> f64 {
    // Requests built through serde skip `with_compatibility`.
    let compatibility = request
        .compatibility_score
        .unwrap_or(scoring.default_compatibility)
        .clamp(0.0, 1.0);

    let score = endpoint.health_score * scoring.health_weight
        + (1.0 - endpoint.load_factor()) * scoring.load_weight
        + compatibility * scoring.compatibility_weight
        + intent_bonus(scoring, &request.category, &endpoint.service_type)
        + response_time_factor(scoring, endpoint.avg_response_time_ms) * scoring.response_time_weight;

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EndpointId;

    fn snapshot(service_type: &str, health: f64, load: u32, avg_ms: f64) -> EndpointSnapshot {
        EndpointSnapshot {
            id: EndpointId::new(service_type),
            service_type: service_type.into(),
            address: "http://x".into(),
            credential_ref: None,
            health_score: health,
            success_rate: 1.0,
            avg_response_time_ms: avg_ms,
            current_load: load,
            max_load: 10,
            last_health_check_ms: 0,
        }
    }

    #[test]
    fn test_score_is_capped_at_one() {
        let scoring = ScoringConfig::default();
        let request = DispatchRequest::new("security").with_compatibility(0.8);
        let ep = snapshot("gpt-4o", 0.9, 0, 0.0);
        // 0.36 + 0.3 + 0.16 + 0.2 + 0.1 = 1.12
        assert_eq!(adaptive_score(&scoring, &ep, &request), 1.0);
    }

    #[test]
    fn test_score_without_bonus() {
        let scoring = ScoringConfig::default();
        let request = DispatchRequest::new("analyze");
        let ep = snapshot("gpt-4o", 0.5, 5, 5000.0);
        // 0.2 + 0.15 + 0.14 + 0 + 0.05
        let score = adaptive_score(&scoring, &ep, &request);
        assert!((score - 0.54).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_compatibility_is_clamped() {
        let scoring = ScoringConfig::default();
        let ep = snapshot("gpt-4o", 0.5, 5, 5000.0);

        let mut low = DispatchRequest::new("analyze");
        low.compatibility_score = Some(-50.0);
        let floor = DispatchRequest::new("analyze").with_compatibility(0.0);
        assert_eq!(adaptive_score(&scoring, &ep, &low), adaptive_score(&scoring, &ep, &floor));

        let mut high = DispatchRequest::new("analyze");
        high.compatibility_score = Some(9.0);
        let ceiling = DispatchRequest::new("analyze").with_compatibility(1.0);
        assert_eq!(adaptive_score(&scoring, &ep, &high), adaptive_score(&scoring, &ep, &ceiling));
    }

    #[test]
    fn test_intent_affinity_table() {
        let scoring = ScoringConfig::default();
        assert_eq!(intent_bonus(&scoring, "debug", &"github-copilot".into()), 0.2);
        assert_eq!(intent_bonus(&scoring, "debug", &"gpt-4o".into()), 0.0);
        assert_eq!(intent_bonus(&scoring, "security", &"claude-3".into()), 0.2);
        assert_eq!(intent_bonus(&scoring, "refactor", &"gpt-4o".into()), 0.0);
    }

    #[test]
    fn test_response_time_factor_floors_at_zero() {
        let scoring = ScoringConfig::default();
        assert_eq!(response_time_factor(&scoring, 0.0), 1.0);
        assert!((response_time_factor(&scoring, 2500.0) - 0.75).abs() < 1e-9);
        assert_eq!(response_time_factor(&scoring, 25_000.0), 0.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let scoring = ScoringConfig::default();
        let request = DispatchRequest::new("analyze").with_compatibility(0.6);
        let ep = snapshot("claude-3", 0.7, 3, 1200.0);
        let first = adaptive_score(&scoring, &ep, &request);
        for _ in 0..100 {
            assert_eq!(adaptive_score(&scoring, &ep, &request), first);
        }
    }
}
