//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the backend registry in configured order
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::validation::{parse_backend_url, validate_config, ValidationError};
use crate::config::{BalancerConfig, ConfigError};
use crate::http::HttpServer;
use crate::load_balancer::BackendRegistry;

/// Fatal error before the balancer starts serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Validate `config` and build the registry from its backend list.
pub fn build_registry(config: &BalancerConfig) -> Result<BackendRegistry, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let urls = config
        .backends
        .iter()
        .map(|raw| parse_backend_url(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Validation(vec![e]))?;

    for url in &urls {
        tracing::info!(backend = %url, "Configured backend");
    }

    BackendRegistry::from_urls(urls)
        .ok_or_else(|| ConfigError::Validation(vec![ValidationError::NoBackends]))
}

/// Build the server and bind its listener.
pub async fn bootstrap(config: &BalancerConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let registry = Arc::new(build_registry(config)?);

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(address.as_str())
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok((HttpServer::new(registry, config), listener))
}
