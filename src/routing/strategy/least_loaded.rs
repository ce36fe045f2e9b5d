//! Least-loaded selection strategy.

use crate::dispatch::DispatchRequest;
use crate::registry::EndpointSnapshot;
use crate::routing::strategy::{first_max_by, SelectionStrategy};

/// Least loaded selector.
/// Selects the candidate with the lowest `current_load / max_load`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastLoaded;

impl SelectionStrategy for LeastLoaded {
    fn select<'a>(
        &self,
        candidates: &'a [EndpointSnapshot],
        _request: &DispatchRequest,
    ) -> Option<&'a EndpointSnapshot> {
        // In case of tie, the first one is selected (stability)
        first_max_by(candidates, |c| -c.load_factor())
    }
}
