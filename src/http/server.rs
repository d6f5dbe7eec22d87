//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router (liveness route + catch-all proxy route)
//! - Wire up middleware (request ID, tracing, panic barrier)
//! - Build the shared pooled client for upstream forwarding
//! - Dispatch each request: select backend, account the connection,
//!   forward, interpret the outcome, log and record metrics

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        header::{HeaderMap, HeaderName, HeaderValue},
        uri::{Authority, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::balancer::Balancer;
use crate::config::schema::{ProxyConfig, TransportConfig};
use crate::http::request::MakeRequestUuid;
use crate::observability::metrics;

/// Connection-specific headers that must not be forwarded.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub balancer: Arc<dyn Balancer>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and strategy.
    pub fn new(config: &ProxyConfig, balancer: Arc<dyn Balancer>) -> Self {
        let state = AppState {
            balancer,
            client: build_client(&config.transport),
        };

        let router = Router::new()
            .route("/health", get(liveness))
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(handle_panic)),
            );

        Self { router }
    }

    /// Run the server until the shutdown signal fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the pooled upstream client shared by all dispatches.
fn build_client(config: &TransportConfig) -> Client<HttpConnector, Body> {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
    connector.set_keepalive(Some(Duration::from_secs(config.keep_alive_secs)));

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(config.max_idle_per_backend)
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .pool_timer(TokioTimer::new())
        .build(connector)
}

/// Liveness endpoint for infrastructure; never proxied.
async fn liveness() -> &'static str {
    "OK"
}

/// Main proxy handler: select a backend, forward, report the outcome.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // 1. Select a backend. No counters are touched on failure.
    let backend = match state.balancer.next_server() {
        Ok(backend) => backend,
        Err(error) => {
            tracing::error!(%error, method = %method, path = %path, "couldn't get server");
            metrics::record_request(method.as_str(), 503, "none", Instant::now());
            return (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response();
        }
    };

    // 2. Account the in-flight request. The guard decrements exactly once
    //    on every exit path, including a panic unwind.
    let _in_flight = backend.track_connection();
    metrics::record_backend_connections(backend.address().as_str(), backend.connections());

    // 3. Rewrite the request onto the backend's address.
    let (mut parts, body) = request.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    append_forwarded_for(&mut parts.headers, client_addr);

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = match Authority::try_from(backend.authority()) {
        Ok(authority) => Some(authority),
        Err(error) => {
            tracing::error!(address = %backend.address(), %error, "bad upstream");
            return (StatusCode::BAD_GATEWAY, "Bad upstream").into_response();
        }
    };
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(error) => {
            tracing::error!(address = %backend.address(), %error, "bad upstream");
            return (StatusCode::BAD_GATEWAY, "Bad upstream").into_response();
        }
    };

    let outbound = Request::from_parts(parts, body);

    // 4. Forward and interpret the outcome.
    let start = Instant::now();
    match state.client.request(outbound).await {
        Ok(response) => {
            let status = response.status();
            tracing::info!(
                address = %backend.address(),
                method = %method,
                path = %path,
                status = status.as_u16(),
                duration = ?start.elapsed(),
                "HTTP request"
            );
            metrics::record_request(method.as_str(), status.as_u16(), backend.address().as_str(), start);

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(error) => {
            // Flip the flag right away so selection skips this backend
            // before the next probe round.
            backend.set_healthy(false);
            tracing::error!(
                address = %backend.address(),
                method = %method,
                path = %path,
                %error,
                duration = ?start.elapsed(),
                "proxy error"
            );
            metrics::record_request(method.as_str(), 502, backend.address().as_str(), start);
            (StatusCode::BAD_GATEWAY, "Upstream server failure").into_response()
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, client_addr: SocketAddr) {
    let name = HeaderName::from_static("x-forwarded-for");
    let client_ip = client_addr.ip().to_string();
    let forwarded = match headers.get(&name).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{prior}, {client_ip}"),
        None => client_ip,
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded) {
        headers.insert(name, value);
    }
}

/// Request-boundary fault barrier: a panic in handling becomes a 500 and
/// never takes the worker down.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "panic recovered");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
