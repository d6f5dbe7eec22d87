//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, liveness route, middleware)
//!     → request.rs (request ID generation)
//!     → [balancer picks backend]
//!     → server.rs proxy handler (rewrite URI, forward, account)
//!     → Response to client
//! ```

pub mod request;
pub mod server;

pub use request::MakeRequestUuid;
pub use server::HttpServer;
