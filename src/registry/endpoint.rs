//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single callable backend instance
//! - Track in-flight load against its capacity
//! - Track health telemetry (health score, success rate, last latency)
//! - Produce consistent point-in-time snapshots for selection
//!
//! # Design Decisions
//! - All mutable telemetry sits behind one mutex per endpoint, so every
//!   read-modify-write sequence is atomic with respect to other updates
//! - Scores are clamped to [0, 1] on every write

use std::borrow::Borrow;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{EndpointConfig, ScoringConfig};

/// Milliseconds since the Unix epoch.
pub fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Logical backend kind (e.g. "gpt-4o").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceType(String);

impl ServiceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Stable endpoint identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an identifier from service type and address.
    pub fn derive(service_type: &ServiceType, address: &str) -> Self {
        Self(format!("{}@{}", service_type, address))
    }

    /// Identifier for a configured endpoint: explicit id, else derived.
    pub fn for_config(config: &EndpointConfig) -> Self {
        match &config.id {
            Some(id) => Self::new(id.clone()),
            None => Self::derive(&ServiceType::new(config.service_type.clone()), &config.address),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EndpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Mutable telemetry of one endpoint.
#[derive(Debug, Clone)]
struct Telemetry {
    health_score: f64,
    success_rate: f64,
    avg_response_time_ms: f64,
    current_load: u32,
    last_health_check_at: SystemTime,
}

impl Telemetry {
    fn load_factor(&self, max_load: u32) -> f64 {
        (self.current_load as f64 / max_load as f64).min(1.0)
    }
}

/// A single backend endpoint.
#[derive(Debug)]
pub struct Endpoint {
    id: EndpointId,
    service_type: ServiceType,
    address: String,
    credential_ref: Option<String>,
    max_load: u32,
    telemetry: Mutex<Telemetry>,
}

impl Endpoint {
    /// Create an endpoint with full health and no load.
    ///
    /// A `max_load` of zero is raised to one.
    pub fn new(
        id: EndpointId,
        service_type: ServiceType,
        address: impl Into<String>,
        credential_ref: Option<String>,
        max_load: u32,
    ) -> Self {
        Self {
            id,
            service_type,
            address: address.into(),
            credential_ref,
            max_load: max_load.max(1),
            telemetry: Mutex::new(Telemetry {
                health_score: 1.0,
                success_rate: 1.0,
                avg_response_time_ms: 0.0,
                current_load: 0,
                last_health_check_at: SystemTime::now(),
            }),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(
            EndpointId::for_config(config),
            ServiceType::new(config.service_type.clone()),
            config.address.clone(),
            config.credential_ref.clone(),
            config.max_load,
        )
    }

    pub fn id(&self) -> &EndpointId {
        &self.id
    }

    pub fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> EndpointSnapshot {
        let t = self.telemetry.lock();
        EndpointSnapshot {
            id: self.id.clone(),
            service_type: self.service_type.clone(),
            address: self.address.clone(),
            credential_ref: self.credential_ref.clone(),
            health_score: t.health_score,
            success_rate: t.success_rate,
            avg_response_time_ms: t.avg_response_time_ms,
            current_load: t.current_load,
            max_load: self.max_load,
            last_health_check_ms: unix_millis(t.last_health_check_at),
        }
    }

    pub(crate) fn increment_load(&self) {
        let mut t = self.telemetry.lock();
        t.current_load = t.current_load.saturating_add(1);
    }

    /// Release one unit of load. Never goes below zero.
    pub(crate) fn decrement_load(&self) {
        let mut t = self.telemetry.lock();
        t.current_load = t.current_load.saturating_sub(1);
    }

    /// Fold a dispatch outcome into the telemetry.
    pub(crate) fn record_outcome(&self, latency_ms: f64, success: bool, scoring: &ScoringConfig) {
        let mut t = self.telemetry.lock();
        t.avg_response_time_ms = latency_ms.max(0.0);
        t.success_rate = if success {
            (t.success_rate + scoring.success_step).min(1.0)
        } else {
            (t.success_rate - scoring.failure_step).max(0.0)
        };
        let load_factor = t.load_factor(self.max_load);
        t.health_score = (t.success_rate * (1.0 - load_factor)).clamp(0.0, 1.0);
    }

    /// Fold a health probe result into the telemetry.
    pub(crate) fn record_probe(&self, healthy: bool, scoring: &ScoringConfig) {
        let mut t = self.telemetry.lock();
        t.last_health_check_at = SystemTime::now();
        t.health_score = if healthy {
            (t.health_score + scoring.sweep_recovery_step).min(1.0)
        } else {
            (t.health_score - scoring.sweep_penalty_step).max(0.0)
        };
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, health_score: f64, current_load: u32) {
        let mut t = self.telemetry.lock();
        t.health_score = health_score;
        t.current_load = current_load;
    }
}

/// Point-in-time copy of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSnapshot {
    pub id: EndpointId,
    pub service_type: ServiceType,
    pub address: String,
    #[serde(skip_serializing)]
    pub credential_ref: Option<String>,
    pub health_score: f64,
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    pub current_load: u32,
    pub max_load: u32,
    pub last_health_check_ms: u64,
}

impl EndpointSnapshot {
    /// `current_load / max_load`, capped at 1.
    pub fn load_factor(&self) -> f64 {
        if self.max_load == 0 {
            return 1.0;
        }
        (self.current_load as f64 / self.max_load as f64).min(1.0)
    }

    /// Healthy enough and below capacity.
    pub fn is_eligible(&self, threshold: f64) -> bool {
        self.health_score > threshold && self.current_load < self.max_load
    }
}
