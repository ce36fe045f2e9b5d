//! Endpoint registry.
//!
//! # Responsibilities
//! - Own every registered endpoint, in registration order
//! - Answer eligibility queries with consistent snapshots
//! - Apply dispatch feedback, load accounting and probe results

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;

use crate::config::{EndpointConfig, ScoringConfig};
use crate::registry::endpoint::{Endpoint, EndpointId, EndpointSnapshot, ServiceType};

/// Errors returned by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("endpoint {0} is already registered")]
    DuplicateEndpoint(EndpointId),
}

/// Thread-safe set of endpoints grouped by service type.
#[derive(Debug)]
pub struct EndpointRegistry {
    /// Registration order; membership changes happen under its write lock.
    ordered: RwLock<Vec<Arc<Endpoint>>>,
    /// Id lookup for the update paths.
    index: DashMap<EndpointId, Arc<Endpoint>>,
    scoring: ScoringConfig,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new(scoring: ScoringConfig) -> Self {
        Self {
            ordered: RwLock::new(Vec::new()),
            index: DashMap::new(),
            scoring,
        }
    }

    /// Create a registry populated from configuration.
    pub fn from_config(
        endpoints: &[EndpointConfig],
        scoring: ScoringConfig,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new(scoring);
        for config in endpoints {
            registry.register(Endpoint::from_config(config))?;
        }
        Ok(registry)
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Add an endpoint.
    pub fn register(&self, endpoint: Endpoint) -> Result<(), RegistryError> {
        let mut ordered = self.ordered.write();
        if self.index.contains_key(endpoint.id()) {
            return Err(RegistryError::DuplicateEndpoint(endpoint.id().clone()));
        }

        let endpoint = Arc::new(endpoint);
        tracing::info!(
            endpoint = %endpoint.id(),
            service_type = %endpoint.service_type(),
            "Endpoint registered"
        );
        self.index.insert(endpoint.id().clone(), endpoint.clone());
        ordered.push(endpoint);
        Ok(())
    }

    /// Remove an endpoint. Returns false if the id was not registered.
    pub fn deregister(&self, id: &str) -> bool {
        let mut ordered = self.ordered.write();
        if self.index.remove(id).is_none() {
            return false;
        }
        ordered.retain(|e| e.id().as_str() != id);
        tracing::info!(endpoint = %id, "Endpoint deregistered");
        true
    }

    /// Bring membership in line with a new endpoint list.
    ///
    /// Endpoints whose id survives keep their telemetry.
    pub fn reconcile(&self, configs: &[EndpointConfig]) {
        let wanted: HashSet<EndpointId> = configs.iter().map(EndpointId::for_config).collect();

        let stale: Vec<EndpointId> = self
            .ordered
            .read()
            .iter()
            .filter(|e| !wanted.contains(e.id()))
            .map(|e| e.id().clone())
            .collect();
        for id in stale {
            self.deregister(id.as_str());
        }

        for config in configs {
            if !self.index.contains_key(&EndpointId::for_config(config)) {
                // Lost a race with a concurrent registration; either copy is fine.
                let _ = self.register(Endpoint::from_config(config));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ordered.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The live endpoint registered under `id`.
    ///
    /// The handle stays bound to that endpoint even if the id is later
    /// deregistered and reused.
    pub fn get(&self, id: &str) -> Option<Arc<Endpoint>> {
        self.index.get(id).map(|e| Arc::clone(e.value()))
    }

    /// Snapshot of one endpoint.
    pub fn snapshot(&self, id: &str) -> Option<EndpointSnapshot> {
        self.index.get(id).map(|e| e.snapshot())
    }

    /// Snapshots of every endpoint in registration order.
    pub fn all(&self) -> Vec<EndpointSnapshot> {
        self.ordered.read().iter().map(|e| e.snapshot()).collect()
    }

    /// Number of currently eligible endpoints.
    pub fn healthy_count(&self) -> usize {
        let threshold = self.scoring.eligibility_threshold;
        self.all().iter().filter(|s| s.is_eligible(threshold)).count()
    }

    /// Eligible endpoints of the given service types.
    ///
    /// Ordered by position in `service_types`, then by registration order.
    /// When none qualify, every eligible endpoint is returned instead.
    pub fn candidates(&self, service_types: &[ServiceType]) -> Vec<EndpointSnapshot> {
        let threshold = self.scoring.eligibility_threshold;
        let eligible: Vec<EndpointSnapshot> = self
            .all()
            .into_iter()
            .filter(|s| s.is_eligible(threshold))
            .collect();

        let mut seen = HashSet::new();
        let mut preferred = Vec::new();
        for service_type in service_types {
            if !seen.insert(service_type) {
                continue;
            }
            preferred.extend(
                eligible
                    .iter()
                    .filter(|s| &s.service_type == service_type)
                    .cloned(),
            );
        }

        if preferred.is_empty() {
            if !eligible.is_empty() {
                tracing::warn!(
                    preferred = ?service_types,
                    fallback = eligible.len(),
                    "No eligible endpoints for preferred service types, using fallback pool"
                );
            }
            return eligible;
        }
        preferred
    }

    /// Apply a dispatch outcome. Returns the updated snapshot.
    pub fn update_metrics(
        &self,
        id: &str,
        latency_ms: f64,
        success: bool,
    ) -> Option<EndpointSnapshot> {
        let endpoint = self.index.get(id)?.clone();
        endpoint.record_outcome(latency_ms, success, &self.scoring);
        Some(endpoint.snapshot())
    }

    /// Returns false if the id is not registered.
    pub fn increment_load(&self, id: &str) -> bool {
        match self.index.get(id) {
            Some(e) => {
                e.increment_load();
                true
            }
            None => false,
        }
    }

    /// Returns false if the id is not registered.
    pub fn decrement_load(&self, id: &str) -> bool {
        match self.index.get(id) {
            Some(e) => {
                e.decrement_load();
                true
            }
            None => false,
        }
    }

    /// Apply a health probe result. Returns the updated snapshot.
    pub fn record_probe(&self, id: &str, healthy: bool) -> Option<EndpointSnapshot> {
        let endpoint = self.index.get(id)?.clone();
        endpoint.record_probe(healthy, &self.scoring);
        Some(endpoint.snapshot())
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, id: &str, health_score: f64, current_load: u32) {
        if let Some(e) = self.index.get(id) {
            e.set_state(health_score, current_load);
        }
    }
}
