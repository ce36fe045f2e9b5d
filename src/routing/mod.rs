//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request category
//!     → rules.rs (RoutingRule: strategy, preferences, deadline, retries)
//!
//! Candidate snapshots + strategy
//!     → strategy/ (one selector per strategy)
//!     → scoring.rs (adaptive strategy only)
//!     → Return: selected endpoint or NoEligibleEndpoint
//! ```
//!
//! # Design Decisions
//! - Rules compiled from config, immutable at runtime, swapped whole on reload
//! - Selection is a pure function of the candidate list and the request
//! - Deterministic: ties go to the earliest candidate

pub mod rules;
pub mod scoring;
pub mod strategy;

pub use rules::{RoutingRule, RoutingRuleTable, Strategy};
pub use strategy::{SelectionStrategy, StrategySelector};
