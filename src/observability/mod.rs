//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, dispatcher and health sweep produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every dispatch log event
//! - Metrics are cheap and independent of the in-process execution history

pub mod logging;
pub mod metrics;
