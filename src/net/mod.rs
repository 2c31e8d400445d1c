//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits, accept retries)
//!     → connection.rs (PendingConnection handed to the service actor)
//!     → service::handshake
//!
//! Connection States:
//!     Accepted → HandshakeSent → Rejected
//!                              → AwaitingClientHandshake → Serving → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded live-connection count prevents resource exhaustion
//! - Each serving task is tracked for graceful shutdown
//! - Accept errors are retried; only a persistent failure stops the node

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker, PendingConnection};
pub use listener::{ConnectionPermit, Listener, ListenerError};
