//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every gateway template parses into an endpoint
//! - Value ranges (timeouts > 0, concurrency >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;
use crate::pool::{Endpoint, EndpointError};

/// A single semantic problem in a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),
    #[error("invalid gateway: {0}")]
    Gateway(#[from] EndpointError),
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    #[error("liveness probe_cid must not be empty")]
    EmptyProbeCid,
    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for gateway in &config.gateways {
        if let Err(e) = Endpoint::parse(gateway) {
            errors.push(e.into());
        }
    }

    let counts = [
        ("liveness.interval_secs", config.liveness.interval_secs),
        ("liveness.timeout_secs", config.liveness.timeout_secs),
        ("liveness.concurrency", config.liveness.concurrency as u64),
        ("race.timeout_secs", config.race.timeout_secs),
    ];
    for (name, value) in counts {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    if config.liveness.probe_cid.is_empty() {
        errors.push(ValidationError::EmptyProbeCid);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
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

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.gateways.push("ftp://mirror.example/ipfs/".into());
        config.liveness.concurrency = 0;
        config.race.timeout_secs = 0;
        config.liveness.probe_cid.clear();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Zero("liveness.concurrency"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Gateway(_))));
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
