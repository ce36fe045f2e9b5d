//! First-candidate selection (direct, batch, streaming).

use crate::dispatch::DispatchRequest;
use crate::registry::EndpointSnapshot;
use crate::routing::strategy::SelectionStrategy;

/// Takes the candidate ordering as the preference.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl SelectionStrategy for FirstCandidate {
    fn select<'a>(
        &self,
        candidates: &'a [EndpointSnapshot],
        _request: &DispatchRequest,
    ) -> Option<&'a EndpointSnapshot> {
        candidates.first()
    }
}
