//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every violation is
//! reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service.name must not be empty")]
    EmptyName,

    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_connections must be greater than 0")]
    ZeroMaxConnections,

    #[error("listener.max_connections ({0}) exceeds the semaphore permit limit")]
    TooManyConnections(usize),

    #[error("listener.accept_backoff_base_ms ({base}) exceeds accept_backoff_max_ms ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("handshake.max_frame_bytes must be at least 64")]
    FrameTooSmall,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    } else if config.listener.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooManyConnections(
            config.listener.max_connections,
        ));
    }

    if config.listener.accept_backoff_base_ms > config.listener.accept_backoff_max_ms {
        errors.push(ValidationError::BackoffRange {
            base: config.listener.accept_backoff_base_ms,
            max: config.listener.accept_backoff_max_ms,
        });
    }

    if config.handshake.max_frame_bytes < 64 {
        errors.push(ValidationError::FrameTooSmall);
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

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
