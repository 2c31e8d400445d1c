//! Register / unregister / shutdown orchestration.
//!
//! Only the service actor calls into this, always with the descriptor it
//! owns, so transitions never interleave. Directory failures are logged and
//! never stop a transition: the local state moves regardless.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::directory::ServiceDirectory;
use crate::lifecycle::shutdown::Shutdown;
use crate::net::InFlightTracker;
use crate::observability::metrics;
use crate::service::{ServiceDelegate, ServiceDescriptor};

pub struct LifecycleManager {
    directory: Arc<dyn ServiceDirectory>,
    delegate: Arc<dyn ServiceDelegate>,
    tracker: InFlightTracker,
    drain_timeout: Option<Duration>,
    stop: Shutdown,
    completion: watch::Sender<bool>,
}

impl LifecycleManager {
    pub fn new(
        directory: Arc<dyn ServiceDirectory>,
        delegate: Arc<dyn ServiceDelegate>,
        tracker: InFlightTracker,
        drain_timeout: Option<Duration>,
    ) -> Self {
        let (completion, _) = watch::channel(false);
        Self {
            directory,
            delegate,
            tracker,
            drain_timeout,
            stop: Shutdown::new(),
            completion,
        }
    }

    /// Receiver that fires when shutdown stops background tasks.
    pub fn subscribe_stop(&self) -> broadcast::Receiver<()> {
        self.stop.subscribe()
    }

    /// Receiver that turns true once shutdown has fully completed.
    pub fn completion(&self) -> watch::Receiver<bool> {
        self.completion.subscribe()
    }

    pub async fn register(&self, descriptor: &mut ServiceDescriptor) {
        if descriptor.is_registered() {
            return;
        }

        if let Err(e) = self.directory.register(descriptor.uuid()).await {
            metrics::record_directory_error("register");
            tracing::error!(uuid = %descriptor.uuid(), error = %e, "Failed to register service");
        }

        descriptor.set_registered(true);
        metrics::record_registered(true);
        tracing::info!(name = %descriptor.name(), uuid = %descriptor.uuid(), "Service registered");
        self.delegate.registered(&descriptor.snapshot());
    }

    pub async fn unregister(&self, descriptor: &mut ServiceDescriptor) {
        if !descriptor.is_registered() {
            return;
        }

        if let Err(e) = self.directory.unregister(descriptor.uuid()).await {
            metrics::record_directory_error("unregister");
            tracing::error!(uuid = %descriptor.uuid(), error = %e, "Failed to unregister service");
        }

        descriptor.set_registered(false);
        metrics::record_registered(false);
        tracing::info!(name = %descriptor.name(), uuid = %descriptor.uuid(), "Service unregistered");
        self.delegate.unregistered(&descriptor.snapshot());
    }

    /// Run the shutdown sequence: unregister, stop background tasks, drain
    /// in-flight connections, remove from the directory, notify the
    /// delegate, release waiters.
    ///
    /// Returns false if shutdown had already begun.
    pub async fn shutdown(&self, descriptor: &mut ServiceDescriptor) -> bool {
        if !descriptor.begin_shutdown() {
            return false;
        }

        tracing::info!(
            name = %descriptor.name(),
            in_flight = self.tracker.active_count(),
            "Service shutting down"
        );

        self.unregister(descriptor).await;
        self.stop.trigger();
        self.drain().await;

        if let Err(e) = self.directory.remove(&descriptor.snapshot()).await {
            metrics::record_directory_error("remove");
            tracing::error!(uuid = %descriptor.uuid(), error = %e, "Failed to remove service");
        }

        self.delegate.stopped(&descriptor.snapshot());
        self.completion.send_replace(true);
        tracing::info!(name = %descriptor.name(), "Shutdown complete");
        true
    }

    async fn drain(&self) {
        match self.drain_timeout {
            None => self.tracker.wait_idle().await,
            Some(limit) => {
                if !self.tracker.wait_idle_timeout(limit).await {
                    tracing::warn!(
                        remaining = self.tracker.active_count(),
                        timeout = ?limit,
                        "Drain timeout elapsed, continuing shutdown"
                    );
                }
            }
        }
    }
}
