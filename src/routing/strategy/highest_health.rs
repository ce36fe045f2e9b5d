//! Highest-health selection strategy (failover).

use crate::dispatch::DispatchRequest;
use crate::registry::EndpointSnapshot;
use crate::routing::strategy::{first_max_by, SelectionStrategy};

/// Selects the candidate with the greatest health score.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighestHealth;

impl SelectionStrategy for HighestHealth {
    fn select<'a>(
        &self,
        candidates: &'a [EndpointSnapshot],
        _request: &DispatchRequest,
    ) -> Option<&'a EndpointSnapshot> {
        first_max_by(candidates, |c| c.health_score)
    }
}
