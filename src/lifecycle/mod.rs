//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry, history, dispatcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → broadcast → background tasks exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then background tasks
//! - Background tasks own a shutdown receiver and exit on their own

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::build_dispatcher;
