//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (JSON on stdout in production)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging; JSON in production, readable in development
//! - Metric updates are cheap atomic operations, safe on the hot path
//! - The metrics exporter is opt-in

pub mod logging;
pub mod metrics;
