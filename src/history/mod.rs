//! Execution history subsystem.
//!
//! # Data Flow
//! ```text
//! Every dispatch attempt (success, failure, timeout, cancellation)
//!     → record.rs (immutable ExecutionRecord)
//!     → recorder.rs (bounded FIFO ring buffer)
//!
//! Readers (admin API, health endpoints):
//!     → recorder.rs get_stats (snapshot copy, aggregated outside the lock)
//! ```
//!
//! # Design Decisions
//! - Fixed capacity; oldest record evicted first
//! - Append is the hot path; readers hold the lock only for a copy

pub mod record;
pub mod recorder;

pub use record::ExecutionRecord;
pub use recorder::{MetricsRecorder, RoutingStats};
