//! Service node: startup, control handle, and the actor behind them.
//!
//! # Data Flow
//! ```text
//! Service::start
//!     → bind listener (failure: ServiceError, nothing published)
//!     → spawn accept loop, signal watcher, actor
//!     → directory add → optional register → delegate started
//!     → ServiceHandle
//!
//! ServiceHandle::{register, unregister, shutdown}
//!     → control queue → actor.rs (one event at a time)
//!
//! accepted connection → actor.rs → handshake.rs → serve.rs (own task)
//! ```

pub mod actor;
pub mod delegate;
pub mod descriptor;
pub mod handler;
pub mod handshake;
pub mod registry;
pub mod serve;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::config::{validation::validate_config, ConfigError, ServiceConfig};
use crate::directory::ServiceDirectory;
use crate::error::ServiceError;
use crate::lifecycle::{spawn_signal_watcher, LifecycleManager};
use crate::net::{InFlightTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::protocol::ClientId;

use self::actor::{ConnectionSettings, Control, ServiceActor};

pub use delegate::{LoggingDelegate, NoopDelegate, ServiceDelegate};
pub use descriptor::{ServiceDescriptor, ServiceInfo};
pub use handler::{EchoHandler, RequestContext, RequestHandler};
pub use handshake::{HandshakeError, HandshakeOutcome};
pub use registry::{ClientRegistry, ClientSession};

/// A request handler wrapped into a network service.
pub struct Service {
    config: ServiceConfig,
    handler: Arc<dyn RequestHandler>,
    directory: Arc<dyn ServiceDirectory>,
    delegate: Arc<dyn ServiceDelegate>,
}

impl Service {
    pub fn new(
        config: ServiceConfig,
        handler: Arc<dyn RequestHandler>,
        directory: Arc<dyn ServiceDirectory>,
    ) -> Self {
        Self {
            config,
            handler,
            directory,
            delegate: Arc::new(NoopDelegate),
        }
    }

    /// Replace the default no-op lifecycle delegate.
    pub fn with_delegate(mut self, delegate: Arc<dyn ServiceDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    /// Bind, publish and start serving.
    ///
    /// Nothing reaches the directory unless the listener bound successfully.
    /// With `register_on_boot` the service registers right after it is
    /// published. The returned handle controls the service and can wait for
    /// its shutdown.
    pub async fn start(self, register_on_boot: bool) -> Result<ServiceHandle, ServiceError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let listener = Listener::bind(&self.config.listener).await?;
        let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
            addr: self.config.listener.bind_address.clone(),
            source,
        })?;

        let info = ServiceInfo::from_config(&self.config.service, local_addr);
        let clients = ClientRegistry::new();
        let tracker = InFlightTracker::new();
        let drain_timeout = match self.config.shutdown.drain_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let lifecycle = LifecycleManager::new(
            Arc::clone(&self.directory),
            Arc::clone(&self.delegate),
            tracker.clone(),
            drain_timeout,
        );

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (connection_tx, connection_rx) = mpsc::unbounded_channel();

        let handle = ServiceHandle {
            control: control_tx,
            clients: clients.clone(),
            local_addr,
            uuid: Arc::from(info.uuid.as_str()),
            done: lifecycle.completion(),
        };

        {
            let trigger = handle.shutdown_trigger();
            let stop = lifecycle.subscribe_stop();
            tokio::spawn(async move {
                if let Err(e) = listener.run(connection_tx, stop).await {
                    tracing::error!(error = %e, "Listener failed, shutting down");
                    trigger.shutdown();
                }
            });
        }

        if self.config.shutdown.handle_signals {
            if let Err(e) =
                spawn_signal_watcher(handle.shutdown_trigger(), lifecycle.subscribe_stop())
            {
                tracing::error!(error = %e, "Failed to install signal handlers");
            }
        }

        let actor = ServiceActor {
            descriptor: ServiceDescriptor::new(info.clone()),
            lifecycle,
            clients,
            tracker,
            handler: self.handler,
            settings: ConnectionSettings {
                handshake_timeout: match self.config.handshake.timeout_ms {
                    0 => None,
                    ms => Some(Duration::from_millis(ms)),
                },
                max_frame_bytes: self.config.handshake.max_frame_bytes,
                evict_on_close: self.config.clients.evict_on_close,
            },
            control: control_rx,
            connections: connection_rx,
        };
        tokio::spawn(actor.run());

        if let Err(e) = self.directory.add(&info).await {
            metrics::record_directory_error("add");
            tracing::error!(uuid = %info.uuid, error = %e, "Failed to add service");
        }
        metrics::record_registered(false);

        tracing::info!(
            name = %info.name,
            uuid = %info.uuid,
            address = %local_addr,
            register_on_boot,
            "Service listening"
        );

        if register_on_boot {
            handle.register();
        }

        let delegate = self.delegate;
        tokio::task::spawn_blocking(move || delegate.started(&info));

        Ok(handle)
    }
}

/// Controls a running service. Cheap to clone.
///
/// `register`, `unregister` and `shutdown` enqueue an event for the service
/// actor and return immediately; the actor applies them in order. Dropping
/// the last handle shuts the service down.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    control: mpsc::UnboundedSender<Control>,
    clients: ClientRegistry,
    local_addr: SocketAddr,
    uuid: Arc<str>,
    done: watch::Receiver<bool>,
}

impl ServiceHandle {
    /// Start accepting requests and announce it to the directory.
    pub fn register(&self) {
        self.send(Control::SetRegistered(true));
    }

    /// Stay online but stop accepting new clients.
    pub fn unregister(&self) {
        self.send(Control::SetRegistered(false));
    }

    /// Begin a graceful shutdown. Calling it again has no further effect.
    pub fn shutdown(&self) {
        self.send(Control::Shutdown);
    }

    /// A shutdown-only view that does not keep the service alive.
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            control: self.control.downgrade(),
        }
    }

    fn send(&self, event: Control) {
        if let Err(e) = self.control.send(event) {
            tracing::debug!(event = ?e.0, "Service actor has exited, event dropped");
        }
    }

    /// Snapshot of the service as seen by the actor after every event
    /// queued before this call. `None` once the service has shut down.
    pub async fn info(&self) -> Option<ServiceInfo> {
        let (tx, rx) = oneshot::channel();
        self.control.send(Control::Describe(tx)).ok()?;
        rx.await.ok()
    }

    /// Session metadata for a connected client.
    pub fn client(&self, client_id: &ClientId) -> Option<ClientSession> {
        self.clients.get(client_id)
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// True once shutdown has fully completed.
    pub fn is_stopped(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait until shutdown has fully completed.
    ///
    /// Fails with [`ServiceError::Terminated`] if the actor died first,
    /// for example because a delegate callback panicked.
    pub async fn wait(&self) -> Result<(), ServiceError> {
        let mut done = self.done.clone();
        done.wait_for(|done| *done)
            .await
            .map(|_| ())
            .map_err(|_| ServiceError::Terminated)
    }
}

/// Requests shutdown without holding the service open.
///
/// Background tasks hold one of these instead of a [`ServiceHandle`], so
/// the control queue still closes once every handle is gone.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    control: mpsc::WeakUnboundedSender<Control>,
}

impl ShutdownTrigger {
    pub fn shutdown(&self) {
        match self.control.upgrade() {
            Some(control) => {
                let _ = control.send(Control::Shutdown);
            }
            None => tracing::debug!("Service already released, shutdown not needed"),
        }
    }
}
