//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a service node.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a mesh service node.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service identity (name, version, region, uuid).
    pub service: IdentityConfig,

    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Handshake settings.
    pub handshake: HandshakeConfig,

    /// Shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Client registry settings.
    pub clients: ClientsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Identity the service publishes to the directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Service name clients look the service up by.
    pub name: String,

    /// Version string published alongside the name.
    pub version: String,

    /// Region / zone label.
    pub region: String,

    /// Unique instance id. Left empty, a UUID v4 is generated at startup.
    pub uuid: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "mesh-service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            region: "local".to_string(),
            uuid: String::new(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000"). Port 0 picks an ephemeral port.
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Consecutive accept failures tolerated before the service shuts itself down.
    pub max_accept_failures: u32,

    /// Base delay between accept retries in milliseconds.
    pub accept_backoff_base_ms: u64,

    /// Maximum delay between accept retries in milliseconds.
    pub accept_backoff_max_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9000".to_string(),
            max_connections: 10_000,
            max_accept_failures: 16,
            accept_backoff_base_ms: 10,
            accept_backoff_max_ms: 1000,
        }
    }
}

/// Handshake configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Deadline for each handshake step in milliseconds (0 = no deadline).
    pub timeout_ms: u64,

    /// Largest frame accepted on a connection, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_frame_bytes: 4 * 1024 * 1024, // 4MiB
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on waiting for in-flight connections, in seconds (0 = wait for all).
    pub drain_timeout_secs: u64,

    /// Install SIGINT/SIGTERM/SIGQUIT handlers that trigger shutdown.
    pub handle_signals: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 0,
            handle_signals: true,
        }
    }
}

/// Client registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// Remove a client's session once its connection ends.
    pub evict_on_close: bool,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            evict_on_close: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
