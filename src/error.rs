//! Errors surfaced to whoever starts or waits on a service.

use thiserror::Error;

use crate::config::ConfigError;
use crate::net::ListenerError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The listener could not be set up; the service was never published.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The service actor stopped without completing shutdown.
    #[error("service actor terminated before shutdown completed")]
    Terminated,
}
