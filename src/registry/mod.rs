//! Endpoint registry subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap / admin API:
//!     EndpointConfig → endpoint.rs (Endpoint) → pool.rs (register)
//!
//! Dispatch:
//!     preferred service types
//!     → pool.rs (candidates: eligible snapshots, fallback pool)
//!     → selection
//!     → increment_load → downstream call → decrement_load
//!     → update_metrics (success rate, health score, latency)
//!
//! Health sweep:
//!     probe result → pool.rs (record_probe)
//! ```
//!
//! # Design Decisions
//! - One registry instance, shared via Arc; no globals
//! - Selection works on snapshots; staleness after the copy is accepted
//! - Per-endpoint mutex serializes telemetry updates

pub mod endpoint;
pub mod pool;

pub use endpoint::{unix_millis, Endpoint, EndpointId, EndpointSnapshot, ServiceType};
pub use pool::{EndpointRegistry, RegistryError};
