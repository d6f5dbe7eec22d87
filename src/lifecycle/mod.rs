//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main):
//!     Load config → Validate → Init logging/metrics → Spawn monitor
//!     → Bind listener → Serve
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs)
//!     → trigger broadcast (shutdown.rs)
//!     → server stops accepting and drains in-flight requests
//!     → health monitor finishes its in-flight tick and exits
//!     → await the monitor task handle
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the stop signal out to every task
//! - Drain is bounded by the configured shutdown timeout
//! - Triggering shutdown twice is harmless

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
