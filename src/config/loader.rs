//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Algorithm;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = parse_config(
            r#"
            [[backends]]
            address = "http://127.0.0.1:9001"
            "#,
        )
        .unwrap();

        assert_eq!(config.algorithm, Algorithm::RoundRobin);
        assert_eq!(config.backends[0].health_path, "/health");
        assert_eq!(config.health_check.interval_secs, 10);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn parses_least_connections_algorithm() {
        let config = parse_config(
            r#"
            algorithm = "least-connections"

            [[backends]]
            address = "http://127.0.0.1:9001"
            health_path = "/healthz"
            "#,
        )
        .unwrap();

        assert_eq!(config.algorithm, Algorithm::LeastConnections);
        assert_eq!(config.backends[0].health_path, "/healthz");
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let err = parse_config(
            r#"
            algorithm = "fastest"

            [[backends]]
            address = "http://127.0.0.1:9001"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn surfaces_validation_errors() {
        let err = parse_config("").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {other}"),
        }
    }
}
