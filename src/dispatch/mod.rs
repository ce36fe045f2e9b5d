//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! DispatchRequest
//!     → rule table lookup (category → RoutingRule, or default rule)
//!     → registry candidates (preferred service types, fallback pool)
//!     → strategy selection
//!     → in_flight.rs (load +1)
//!     → executor.rs under the rule deadline
//!     → in_flight.rs (load -1, telemetry, execution record)
//!     → retry within the rule's retry budget
//!     → RoutingResult
//! ```
//!
//! # Design Decisions
//! - The dispatcher never returns an `Err`; failures are folded into the result
//! - Load release happens in a drop guard so cancellation cannot leak load
//! - Latency is measured here, not reported by the executor

pub mod dispatcher;
pub mod error;
pub mod executor;
pub(crate) mod in_flight;
pub mod request;
pub mod result;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, ErrorKind};
pub use executor::{DownstreamExecutor, ExecutorError, HttpExecutor};
pub use request::DispatchRequest;
pub use result::{DispatchStatus, RoutingResult};
