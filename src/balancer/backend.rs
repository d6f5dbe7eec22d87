//! Shared per-backend state.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track active connections (for the least-connections strategy)
//! - Track the health flag written by probes and forwarding failures
//!
//! Each field is synchronized on its own; there is no combined
//! read-modify-write across fields. Readers never take a lock.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use url::Url;

/// A single backend server.
///
/// Created once at startup and shared between the strategies, the health
/// monitor, and in-flight requests. Membership of the backend set never
/// changes at runtime.
#[derive(Debug)]
pub struct Backend {
    /// Base URL requests are forwarded to.
    address: Url,
    /// Pre-computed host:port used when rewriting request URIs.
    authority: String,
    /// Path appended to `address` for health probes.
    health_path: String,
    /// Current health flag. Backends start healthy and earn demotion.
    healthy: AtomicBool,
    /// Number of requests currently being forwarded to this backend.
    /// A load signal only, not an admission limit.
    active_connections: AtomicI64,
}

impl Backend {
    pub fn new(address: Url, health_path: impl Into<String>) -> Self {
        let host = address.host_str().unwrap_or_default();
        let authority = match address.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Self {
            address,
            authority,
            health_path: health_path.into(),
            healthy: AtomicBool::new(true),
            active_connections: AtomicI64::new(0),
        }
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Host and port of the backend, for request URI rewriting.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Full URL probed by the health monitor.
    pub fn health_url(&self) -> String {
        format!(
            "{}{}",
            self.address.as_str().trim_end_matches('/'),
            self.health_path
        )
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn set_healthy(&self, value: bool) {
        self.healthy.store(value, Ordering::Relaxed);
    }

    pub fn connections(&self) -> i64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    fn inc_connections(&self) {
        let value = self.active_connections.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(address = %self.address, count = value, "incremented active connections");
    }

    fn dec_connections(&self) {
        let value = self.active_connections.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::debug!(address = %self.address, count = value, "decremented active connections");
    }

    /// Count one in-flight request against this backend.
    ///
    /// The returned guard decrements the counter exactly once when dropped,
    /// on any exit path including a panic unwind.
    pub fn track_connection(self: &Arc<Self>) -> ConnectionGuard {
        self.inc_connections();
        ConnectionGuard {
            backend: Arc::clone(self),
        }
    }
}

/// RAII pairing for the active-connection counter.
#[derive(Debug)]
pub struct ConnectionGuard {
    backend: Arc<Backend>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.backend.dec_connections();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn backend(addr: &str) -> Arc<Backend> {
        Arc::new(Backend::new(Url::parse(addr).unwrap(), "/health"))
    }

    #[test]
    fn health_url_joins_address_and_path() {
        let b = backend("http://127.0.0.1:9001");
        assert_eq!(b.health_url(), "http://127.0.0.1:9001/health");
    }

    #[test]
    fn authority_keeps_host_and_port() {
        let b = backend("http://127.0.0.1:9001");
        assert_eq!(b.authority(), "127.0.0.1:9001");

        let no_port = backend("http://backend.internal");
        assert_eq!(no_port.authority(), "backend.internal");
    }

    #[test]
    fn starts_healthy_with_zero_connections() {
        let b = backend("http://127.0.0.1:9001");
        assert!(b.is_healthy());
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn guard_pairs_increment_and_decrement() {
        let b = backend("http://127.0.0.1:9001");
        {
            let _guard = b.track_connection();
            assert_eq!(b.connections(), 1);
        }
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn concurrent_guards_do_not_lose_updates() {
        let b = backend("http://127.0.0.1:9001");
        let mut handles = Vec::new();
        for _ in 0..8 {
            let b = Arc::clone(&b);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1_000 {
                    let _guard = b.track_connection();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn guard_decrements_during_panic_unwind() {
        let b = backend("http://127.0.0.1:9001");
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = b.track_connection();
            panic!("forwarding blew up");
        }));
        assert!(result.is_err());
        assert_eq!(b.connections(), 0);
    }
}
