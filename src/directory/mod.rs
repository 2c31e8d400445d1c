//! Service directory.
//!
//! The directory is the cluster-wide record of which services exist and
//! which of them currently take requests. A service talks to it through
//! [`ServiceDirectory`]; the node never fails because the directory did.
//!
//! ```text
//! Service::start   → add(info)
//! register()       → register(uuid)
//! unregister()     → unregister(uuid)
//! shutdown()       → unregister(uuid) … remove(info)
//! ```

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::service::ServiceInfo;

pub use memory::InMemoryDirectory;

/// Errors reported by a directory backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No entry exists for the given service id.
    #[error("service {0} is not known to the directory")]
    NotFound(String),

    /// The directory could not be reached.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("directory error: {0}")]
    Backend(String),
}

/// Operations a service performs against the directory.
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// Publish a service instance. It is not taking requests until registered.
    async fn add(&self, info: &ServiceInfo) -> Result<(), DirectoryError>;

    /// Mark the instance as accepting requests.
    async fn register(&self, uuid: &str) -> Result<(), DirectoryError>;

    /// Mark the instance as no longer accepting requests.
    async fn unregister(&self, uuid: &str) -> Result<(), DirectoryError>;

    /// Drop the instance entirely.
    async fn remove(&self, info: &ServiceInfo) -> Result<(), DirectoryError>;
}
