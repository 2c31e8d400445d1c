//! Service identity and actor-owned state.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IdentityConfig;

/// What the directory and delegates see of a service.
///
/// Always a snapshot: the live flags belong to the service actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub uuid: String,
    pub name: String,
    pub version: String,
    pub region: String,
    pub addr: SocketAddr,
    pub registered: bool,
}

impl ServiceInfo {
    /// Build the identity for a service bound to `addr`.
    /// An empty configured uuid gets a fresh UUID v4.
    pub fn from_config(identity: &IdentityConfig, addr: SocketAddr) -> Self {
        let uuid = if identity.uuid.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            identity.uuid.clone()
        };

        Self {
            uuid,
            name: identity.name.clone(),
            version: identity.version.clone(),
            region: identity.region.clone(),
            addr,
            registered: false,
        }
    }
}

/// The mutable service state owned by the actor.
#[derive(Debug)]
pub struct ServiceDescriptor {
    info: ServiceInfo,
    shutting_down: bool,
}

impl ServiceDescriptor {
    pub fn new(info: ServiceInfo) -> Self {
        Self {
            info,
            shutting_down: false,
        }
    }

    pub fn snapshot(&self) -> ServiceInfo {
        self.info.clone()
    }

    pub fn uuid(&self) -> &str {
        &self.info.uuid
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn is_registered(&self) -> bool {
        self.info.registered
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    pub(crate) fn set_registered(&mut self, registered: bool) {
        self.info.registered = registered;
    }

    /// Enter shutdown. Returns false if already shutting down.
    pub(crate) fn begin_shutdown(&mut self) -> bool {
        !std::mem::replace(&mut self.shutting_down, true)
    }
}
