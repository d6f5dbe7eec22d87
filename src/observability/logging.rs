//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::Environment;

/// Initialize the global tracing subscriber.
///
/// Production gets JSON at info level; development gets a readable format
/// at debug level. `RUST_LOG` overrides either default.
pub fn init(env: Environment) {
    let default_filter = match env {
        Environment::Production => "load_balancer=info,tower_http=info",
        Environment::Development => "load_balancer=debug,tower_http=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match env {
        Environment::Production => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        Environment::Development => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
