//! Mesh service node library.
//!
//! Wraps a [`RequestHandler`] into a TCP service that publishes itself to a
//! [`ServiceDirectory`], handshakes every client, and shuts down gracefully.

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod resilience;
pub mod service;

pub use config::ServiceConfig;
pub use directory::{InMemoryDirectory, ServiceDirectory};
pub use error::ServiceError;
pub use service::{
    RequestContext, RequestHandler, Service, ServiceDelegate, ServiceHandle, ServiceInfo,
    ShutdownTrigger,
};
