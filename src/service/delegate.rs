//! Lifecycle callbacks supplied by the application.

use crate::service::ServiceInfo;

/// Hooks the service calls as it moves through its lifecycle.
///
/// `started` runs on a blocking thread without the service waiting for it.
/// The other hooks run inline on the service actor, so they should return
/// quickly. A panic in a hook terminates the actor and is reported by
/// [`ServiceHandle::wait`](crate::service::ServiceHandle::wait).
pub trait ServiceDelegate: Send + Sync + 'static {
    fn started(&self, _service: &ServiceInfo) {}

    fn stopped(&self, _service: &ServiceInfo) {}

    fn registered(&self, _service: &ServiceInfo) {}

    fn unregistered(&self, _service: &ServiceInfo) {}
}

/// A delegate that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl ServiceDelegate for NoopDelegate {}

/// A delegate that logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDelegate;

impl ServiceDelegate for LoggingDelegate {
    fn started(&self, service: &ServiceInfo) {
        tracing::info!(name = %service.name, uuid = %service.uuid, addr = %service.addr, "Service started");
    }

    fn stopped(&self, service: &ServiceInfo) {
        tracing::info!(name = %service.name, uuid = %service.uuid, "Service stopped");
    }

    fn registered(&self, service: &ServiceInfo) {
        tracing::info!(name = %service.name, uuid = %service.uuid, "Service registered");
    }

    fn unregistered(&self, service: &ServiceInfo) {
        tracing::info!(name = %service.name, uuid = %service.uuid, "Service unregistered");
    }
}
