//! Round-robin selection strategy.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::balancer::backend::Backend;
use crate::balancer::{Balancer, SelectionError};

/// Rotating selector.
///
/// Keeps a cursor over the backend set and hands out healthy backends in
/// set order, wrapping around. Unhealthy backends are skipped without
/// disturbing the cycle. The scan runs under the cursor lock so concurrent
/// callers see one linear rotation.
pub struct RoundRobin {
    backends: Vec<Arc<Backend>>,
    /// Index of the last backend returned. Starts at -1 so the first
    /// selection yields index 0.
    cursor: Mutex<i64>,
}

impl RoundRobin {
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            cursor: Mutex::new(-1),
        }
    }
}

impl Balancer for RoundRobin {
    fn next_server(&self) -> Result<Arc<Backend>, SelectionError> {
        let total = self.backends.len();
        if total == 0 {
            return Err(SelectionError::NoBackends);
        }

        let mut cursor = self.cursor.lock();
        for _ in 0..total {
            *cursor = (*cursor + 1) % total as i64;
            let backend = &self.backends[*cursor as usize];
            if backend.is_healthy() {
                tracing::debug!(address = %backend.address(), index = *cursor, "next server was chosen");
                return Ok(Arc::clone(backend));
            }
        }

        Err(SelectionError::NoHealthyBackend)
    }
}
