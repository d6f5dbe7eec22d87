//! Least-connections selection strategy.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::balancer::backend::Backend;
use crate::balancer::{Balancer, SelectionError};

/// Least-connections selector.
///
/// Scans the backend set once per call and picks the healthy backend with
/// the fewest active connections; ties go to the first occurrence in set
/// order. The scan runs under a lock so concurrent callers observe a
/// single selection order, even though counter reads for other backends
/// are not synchronized with it.
pub struct LeastConnections {
    backends: Vec<Arc<Backend>>,
    scan: Mutex<()>,
}

impl LeastConnections {
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            scan: Mutex::new(()),
        }
    }
}

impl Balancer for LeastConnections {
    fn next_server(&self) -> Result<Arc<Backend>, SelectionError> {
        let _scan = self.scan.lock();

        let mut selected: Option<&Arc<Backend>> = None;
        let mut min_connections = i64::MAX;

        for backend in &self.backends {
            if !backend.is_healthy() {
                continue;
            }

            let connections = backend.connections();
            if selected.is_none() || connections < min_connections {
                selected = Some(backend);
                min_connections = connections;
            }
        }

        match selected {
            Some(backend) => {
                tracing::debug!(
                    address = %backend.address(),
                    connections = min_connections,
                    "next server was chosen"
                );
                Ok(Arc::clone(backend))
            }
            None => Err(SelectionError::NoHealthyBackend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn backends(n: usize) -> Vec<Arc<Backend>> {
        (0..n)
            .map(|i| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 9000 + i)).unwrap();
                Arc::new(Backend::new(url, "/health"))
            })
            .collect()
    }

    fn load(backend: &Arc<Backend>, count: usize) -> Vec<crate::balancer::backend::ConnectionGuard> {
        (0..count).map(|_| backend.track_connection()).collect()
    }

    #[test]
    fn picks_backend_with_fewest_connections() {
        let set = backends(2);
        let _held = load(&set[0], 1);
        let lb = LeastConnections::new(set.clone());

        let chosen = lb.next_server().unwrap();
        assert!(Arc::ptr_eq(&chosen, &set[1]));
    }

    #[test]
    fn tie_breaks_on_first_occurrence() {
        let set = backends(3);
        let _a = load(&set[0], 2);
        let _b = load(&set[1], 1);
        let _c = load(&set[2], 1);
        let lb = LeastConnections::new(set.clone());

        let chosen = lb.next_server().unwrap();
        assert!(Arc::ptr_eq(&chosen, &set[1]));
    }

    #[test]
    fn ignores_unhealthy_backends() {
        let set = backends(2);
        set[0].set_healthy(false);
        let _held = load(&set[1], 5);
        let lb = LeastConnections::new(set.clone());

        let chosen = lb.next_server().unwrap();
        assert!(Arc::ptr_eq(&chosen, &set[1]));
    }

    #[test]
    fn fails_when_all_backends_unhealthy() {
        let set = backends(2);
        set[0].set_healthy(false);
        set[1].set_healthy(false);
        let lb = LeastConnections::new(set);

        assert_eq!(lb.next_server().unwrap_err(), SelectionError::NoHealthyBackend);
    }

    #[test]
    fn fails_when_no_backends_configured() {
        let lb = LeastConnections::new(Vec::new());
        assert_eq!(lb.next_server().unwrap_err(), SelectionError::NoHealthyBackend);
    }
}
