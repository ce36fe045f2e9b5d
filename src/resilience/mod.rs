//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Failed dispatch attempt (error or timeout):
//!     → dispatcher checks remaining retry budget of the rule
//!     → backoff.rs (delay before the next attempt)
//!     → candidates re-gathered, endpoint re-selected
//! ```
//!
//! # Design Decisions
//! - Every downstream call has a deadline (the rule's timeout)
//! - Retries re-run selection, so a failing endpoint can be avoided
//! - Backoff is off by default; jitter prevents thundering herd when on

pub mod backoff;
