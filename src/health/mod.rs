//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer tick
//!     → monitor.rs probes every backend concurrently
//!     → join all probes of the tick
//!     → write health flags on the shared backend records
//!
//! Shutdown signal
//!     → finish the in-flight tick's probes
//!     → exit the loop (awaiting the task handle observes quiescence)
//! ```
//!
//! # Design Decisions
//! - Probe failures flip the flag and are logged, never surfaced as errors
//! - Ticks never overlap; probes within a tick are concurrent
//! - The dispatcher can also flip a flag on forwarding failure, ahead of
//!   the next tick

pub mod monitor;

pub use monitor::HealthMonitor;
