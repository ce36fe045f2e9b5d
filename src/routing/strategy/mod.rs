//! Endpoint selection strategies.
//!
//! # Data Flow
//! ```text
//! Rule strategy + eligible candidates + request
//!     → StrategySelector (exhaustive match on Strategy)
//!     → one SelectionStrategy:
//!         - first.rs (direct, batch, streaming)
//!         - least_loaded.rs (load_balanced)
//!         - highest_health.rs (failover)
//!         - adaptive.rs (adaptive)
//!     → selected snapshot or NoEligibleEndpoint
//! ```
//!
//! # Design Decisions
//! - Selectors are pure: no side effects, no hidden state
//! - Ties go to the earliest candidate
//! - Batch and streaming differ from direct only in result decoration

pub mod adaptive;
pub mod first;
pub mod highest_health;
pub mod least_loaded;

use std::fmt::Debug;

use crate::config::ScoringConfig;
use crate::dispatch::{DispatchError, DispatchRequest};
use crate::registry::EndpointSnapshot;
use crate::routing::rules::Strategy;

pub use adaptive::AdaptiveScore;
pub use first::FirstCandidate;
pub use highest_health::HighestHealth;
pub use least_loaded::LeastLoaded;

/// Picks one endpoint out of an ordered candidate list.
pub trait SelectionStrategy: Send + Sync + Debug {
    fn select<'a>(
        &self,
        candidates: &'a [EndpointSnapshot],
        request: &DispatchRequest,
    ) -> Option<&'a EndpointSnapshot>;
}

/// First candidate with the strictly greatest key.
pub(crate) fn first_max_by<F>(candidates: &[EndpointSnapshot], key: F) -> Option<&EndpointSnapshot>
where
    F: Fn(&EndpointSnapshot) -> f64,
{
    let mut best: Option<(&EndpointSnapshot, f64)> = None;
    for candidate in candidates {
        let value = key(candidate);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((candidate, value)),
        }
    }
    best.map(|(c, _)| c)
}

/// Maps each strategy to its selector.
#[derive(Debug)]
pub struct StrategySelector {
    first: FirstCandidate,
    least_loaded: LeastLoaded,
    highest_health: HighestHealth,
    adaptive: AdaptiveScore,
}

impl StrategySelector {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self {
            first: FirstCandidate,
            least_loaded: LeastLoaded,
            highest_health: HighestHealth,
            adaptive: AdaptiveScore::new(scoring),
        }
    }

    fn selector(&self, strategy: Strategy) -> &dyn SelectionStrategy {
        match strategy {
            Strategy::Direct | Strategy::Batch | Strategy::Streaming => &self.first,
            Strategy::LoadBalanced => &self.least_loaded,
            Strategy::Failover => &self.highest_health,
            Strategy::Adaptive => &self.adaptive,
        }
    }

    /// Select an endpoint, or `NoEligibleEndpoint` when there are no candidates.
    pub fn select(
        &self,
        strategy: Strategy,
        candidates: &[EndpointSnapshot],
        request: &DispatchRequest,
    ) -> Result<EndpointSnapshot, DispatchError> {
        self.selector(strategy)
            .select(candidates, request)
            .cloned()
            .ok_or_else(|| DispatchError::NoEligibleEndpoint {
                category: request.category.clone(),
            })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::snapshot;
    use super::*;

    #[test]
    fn test_empty_candidates_is_no_eligible_endpoint() {
        let selector = StrategySelector::new(ScoringConfig::default());
        let request = DispatchRequest::new("refactor");
        for strategy in [
            Strategy::Direct,
            Strategy::LoadBalanced,
            Strategy::Failover,
            Strategy::Adaptive,
            Strategy::Batch,
            Strategy::Streaming,
        ] {
            let err = selector.select(strategy, &[], &request).unwrap_err();
            assert_eq!(
                err,
                DispatchError::NoEligibleEndpoint { category: "refactor".into() }
            );
        }
    }

    #[test]
    fn test_batch_and_streaming_select_like_direct() {
        let selector = StrategySelector::new(ScoringConfig::default());
        let request = DispatchRequest::new("generate");
        let candidates = vec![snapshot("e1", 0.6, 9, 10), snapshot("e2", 1.0, 0, 10)];
        for strategy in [Strategy::Direct, Strategy::Batch, Strategy::Streaming] {
            let chosen = selector.select(strategy, &candidates, &request).unwrap();
            assert_eq!(chosen.id.as_str(), "e1");
        }
    }

    #[test]
    fn test_first_max_prefers_earliest_on_tie() {
        let candidates = vec![
            snapshot("e1", 0.7, 0, 10),
            snapshot("e2", 0.9, 0, 10),
            snapshot("e3", 0.9, 0, 10),
        ];
        let best = first_max_by(&candidates, |c| c.health_score).unwrap();
        assert_eq!(best.id.as_str(), "e2");
    }
}
