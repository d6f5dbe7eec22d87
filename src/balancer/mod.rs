//! Backend selection subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the dispatcher
//!     → Balancer::next_server()
//!         - round_robin.rs (rotate through healthy backends)
//!         - least_conn.rs (pick healthy backend with fewest connections)
//!     → backend.rs (shared per-backend state, connection tracking)
//!     → Return selected backend or error
//! ```
//!
//! # Design Decisions
//! - Backends are shared via Arc; the health monitor and the strategies
//!   mutate the same records, never copies
//! - A selection call is serialized internally so concurrent callers
//!   observe one linear history of selections
//! - Unhealthy backends are skipped, never removed from the set

pub mod backend;
pub mod least_conn;
pub mod round_robin;

use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::Algorithm;
use self::backend::Backend;
use self::least_conn::LeastConnections;
use self::round_robin::RoundRobin;

/// Selection failure reported to the dispatcher.
///
/// Both variants are per-request conditions and map to 503 at the HTTP
/// boundary; neither is fatal to the process.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no backends configured")]
    NoBackends,

    #[error("no healthy backend available")]
    NoHealthyBackend,
}

/// A backend selection strategy.
///
/// Implementations read the shared backend records but never write them;
/// the only state a strategy mutates is its own (e.g. a rotation cursor).
pub trait Balancer: Send + Sync {
    fn next_server(&self) -> Result<Arc<Backend>, SelectionError>;
}

/// Construct the strategy named by the configuration.
pub fn for_algorithm(algorithm: Algorithm, backends: Vec<Arc<Backend>>) -> Arc<dyn Balancer> {
    match algorithm {
        Algorithm::RoundRobin => Arc::new(RoundRobin::new(backends)),
        Algorithm::LeastConnections => Arc::new(LeastConnections::new(backends)),
    }
}
