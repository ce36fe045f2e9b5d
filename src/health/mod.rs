//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (monitor.rs)
//!     → sweep.rs (probe every endpoint concurrently)
//!     → prober.rs (AssumeHealthy or HTTP GET)
//!     → registry record_probe (+recovery step / -penalty step)
//! ```
//!
//! # Design Decisions
//! - Probe feedback and dispatch feedback both adjust the same health score
//! - The default prober assumes success, so idle endpoints drift back to healthy
//! - A probe that overruns its timeout counts as a failure

pub mod monitor;
pub mod prober;
pub mod sweep;

pub use monitor::HealthMonitor;
pub use prober::{AssumeHealthy, HealthProber, HttpProber, ProbeError};
pub use sweep::{sweep, SweepSummary};
