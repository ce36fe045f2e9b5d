//! Adaptive selection strategy.

use crate::config::ScoringConfig;
use crate::dispatch::DispatchRequest;
use crate::registry::EndpointSnapshot;
use crate::routing::scoring::adaptive_score;
use crate::routing::strategy::{first_max_by, SelectionStrategy};

/// Selects the candidate with the greatest adaptive score.
#[derive(Debug, Clone)]
pub struct AdaptiveScore {
    scoring: ScoringConfig,
}

impl AdaptiveScore {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }
}

impl SelectionStrategy for AdaptiveScore {
    fn select<'a>(
        &self,
        candidates: &'a [EndpointSnapshot],
        request: &DispatchRequest,
    ) -> Option<&'a EndpointSnapshot> {
        first_max_by(candidates, |c| adaptive_score(&self.scoring, c, request))
    }
}
