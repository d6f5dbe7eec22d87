//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend `{address}`: {reason}")]
    InvalidBackend { address: String, reason: String },

    #[error("invalid listener bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("invalid metrics address `{0}`")]
    InvalidMetricsAddress(String),

    #[error("health check `{field}` must be greater than zero")]
    InvalidHealthCheck { field: &'static str },

    #[error("transport `{field}` must be greater than zero")]
    InvalidTransport { field: &'static str },

    #[error("shutdown `timeout_secs` must be greater than zero")]
    InvalidShutdownTimeout,
}

/// Check a parsed configuration for semantic errors, collecting every
/// problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for backend in &config.backends {
        match Url::parse(&backend.address) {
            Ok(url) if url.scheme() != "http" => {
                errors.push(ValidationError::InvalidBackend {
                    address: backend.address.clone(),
                    reason: "scheme must be http".to_string(),
                });
            }
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::InvalidBackend {
                    address: backend.address.clone(),
                    reason: "missing host".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                errors.push(ValidationError::InvalidBackend {
                    address: backend.address.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if !backend.health_path.starts_with('/') {
            errors.push(ValidationError::InvalidBackend {
                address: backend.address.clone(),
                reason: format!("health path `{}` must start with `/`", backend.health_path),
            });
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheck {
            field: "interval_secs",
        });
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheck {
            field: "timeout_secs",
        });
    }

    if config.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::InvalidTransport {
            field: "connect_timeout_secs",
        });
    }
    if config.transport.keep_alive_secs == 0 {
        errors.push(ValidationError::InvalidTransport {
            field: "keep_alive_secs",
        });
    }
    if config.transport.max_idle_per_backend == 0 {
        errors.push(ValidationError::InvalidTransport {
            field: "max_idle_per_backend",
        });
    }
    if config.transport.idle_timeout_secs == 0 {
        errors.push(ValidationError::InvalidTransport {
            field: "idle_timeout_secs",
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.shutdown.timeout_secs == 0 {
        errors.push(ValidationError::InvalidShutdownTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
