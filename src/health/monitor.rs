//! Active health probing.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::balancer::backend::Backend;
use crate::observability::metrics;

/// Background loop that keeps backend health flags current.
///
/// Spawn `run` on a task and keep the `JoinHandle`; awaiting the handle
/// after triggering shutdown blocks until any in-flight probes finish.
pub struct HealthMonitor {
    backends: Vec<Arc<Backend>>,
    interval: Duration,
    timeout: Duration,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(backends: Vec<Arc<Backend>>, interval: Duration, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            backends,
            interval,
            timeout,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.timeout,
            backends = self.backends.len(),
            "health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Checked first so a pending stop never starts another tick.
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("health monitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.check_all().await;
                }
            }
        }
    }

    /// Probe every backend concurrently and wait for the whole round.
    async fn check_all(&self) {
        tracing::debug!("health check started");

        let results = join_all(self.backends.iter().map(|b| self.probe(b))).await;
        let failed = results.iter().filter(|healthy| !**healthy).count();

        tracing::info!(
            healthy = results.len() - failed,
            unhealthy = failed,
            "health check finished"
        );
    }

    /// One GET against the backend's health URL. Success means the
    /// connection succeeded and the response status is 200.
    async fn probe(&self, backend: &Arc<Backend>) -> bool {
        let url = backend.health_url();

        let request = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(header::USER_AGENT, "load-balancer-health-check")
            .body(Body::empty());

        let healthy = match request {
            Ok(request) => match time::timeout(self.timeout, self.client.request(request)).await {
                Ok(Ok(response)) => {
                    let ok = response.status() == StatusCode::OK;
                    if !ok {
                        tracing::warn!(path = %url, status = %response.status(), "health check failed");
                    }
                    ok
                }
                Ok(Err(error)) => {
                    tracing::warn!(path = %url, %error, "health check failed");
                    false
                }
                Err(_) => {
                    tracing::warn!(path = %url, timeout = ?self.timeout, "health check timed out");
                    false
                }
            },
            Err(error) => {
                tracing::error!(path = %url, %error, "failed to build health check request");
                false
            }
        };

        backend.set_healthy(healthy);
        metrics::record_backend_health(backend.address().as_str(), healthy);
        healthy
    }
}
