//! Adaptive request dispatch engine library.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod history;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod routing;

pub use config::schema::EngineConfig;
pub use dispatch::{DispatchRequest, Dispatcher, RoutingResult};
pub use lifecycle::Shutdown;
