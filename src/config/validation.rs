//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Canonicalize backend URLs
//! - Validate value ranges (intervals > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::BalancerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("duplicate backend '{0}'")]
    DuplicateBackend(String),

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Parse a backend URL into its canonical form.
///
/// Only plain `http` upstreams with an explicit host are accepted.
pub fn parse_backend_url(raw: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidBackendUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    // Backend identity is the canonical URL, so two spellings of one
    // upstream are duplicates too.
    let mut seen = HashSet::new();
    for raw in &config.backends {
        match parse_backend_url(raw) {
            Ok(url) => {
                if !seen.insert(url.clone()) {
                    errors.push(ValidationError::DuplicateBackend(url.to_string()));
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::Zero("health_check.interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::Zero("health_check.timeout_secs"));
        }
    }
    if config.retries.max_retries == 0 {
        errors.push(ValidationError::Zero("retries.max_retries"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(backends: &[&str]) -> BalancerConfig {
        BalancerConfig {
            backends: backends.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config_with(&["http://127.0.0.1:3000", "http://localhost:3001"]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_backends_rejected() {
        let errors = validate_config(&config_with(&[])).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoBackends]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = config_with(&["not a url", "https://secure:443"]);
        config.listener.bind_address = "nowhere".into();
        config.retries.max_retries = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::InvalidBackendUrl { .. }));
        assert!(matches!(errors[1], ValidationError::InvalidBackendUrl { .. }));
        assert_eq!(errors[2], ValidationError::InvalidBindAddress("nowhere".into()));
        assert_eq!(errors[3], ValidationError::Zero("retries.max_retries"));
    }

    #[test]
    fn test_duplicate_backends_rejected() {
        let config = config_with(&[
            "http://10.0.0.1:80",
            "http://10.0.0.2:80",
            "http://10.0.0.1/",
        ]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateBackend("http://10.0.0.1/".into())]
        );
    }

    #[test]
    fn test_disabled_health_check_skips_interval_checks() {
        let mut config = config_with(&["http://127.0.0.1:3000"]);
        config.health_check.enabled = false;
        config.health_check.interval_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_backend_url_is_canonicalized() {
        let a = parse_backend_url("http://LOCALHOST:80").unwrap();
        let b = parse_backend_url(" http://localhost/ ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "http://localhost/");
    }

    #[test]
    fn test_backend_url_requires_host() {
        assert!(parse_backend_url("http://").is_err());
        assert!(parse_backend_url("localhost:3000").is_err());
    }
}
