//! The service actor.
//!
//! One task owns the [`ServiceDescriptor`]. Connections, registration
//! toggles and shutdown all arrive as messages and are processed one at a
//! time, so every handshake sees the registration flag left by the last
//! toggle processed before it, and no lock guards the flag.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::lifecycle::LifecycleManager;
use crate::net::{InFlightTracker, PendingConnection};
use crate::observability::metrics;
use crate::protocol::WireTransport;
use crate::service::handler::{RequestContext, RequestHandler};
use crate::service::handshake::{self, HandshakeOutcome};
use crate::service::registry::ClientRegistry;
use crate::service::serve::serve_connection;
use crate::service::{ServiceDescriptor, ServiceInfo};

/// Control messages sent through a [`ServiceHandle`](super::ServiceHandle).
#[derive(Debug)]
pub(crate) enum Control {
    SetRegistered(bool),
    Describe(oneshot::Sender<ServiceInfo>),
    Shutdown,
}

/// Per-connection settings the actor applies.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionSettings {
    pub handshake_timeout: Option<Duration>,
    pub max_frame_bytes: usize,
    pub evict_on_close: bool,
}

pub(crate) struct ServiceActor {
    pub descriptor: ServiceDescriptor,
    pub lifecycle: LifecycleManager,
    pub clients: ClientRegistry,
    pub tracker: InFlightTracker,
    pub handler: Arc<dyn RequestHandler>,
    pub settings: ConnectionSettings,
    pub control: mpsc::UnboundedReceiver<Control>,
    pub connections: mpsc::UnboundedReceiver<PendingConnection>,
}

impl ServiceActor {
    pub async fn run(self) {
        let ServiceActor {
            mut descriptor,
            lifecycle,
            clients,
            tracker,
            handler,
            settings,
            mut control,
            mut connections,
        } = self;

        let mut accepting = true;

        loop {
            tokio::select! {
                // Control first: a toggle enqueued before a connection
                // arrived must apply to that connection's handshake.
                biased;

                event = control.recv() => match event {
                    Some(Control::SetRegistered(true)) => lifecycle.register(&mut descriptor).await,
                    Some(Control::SetRegistered(false)) => lifecycle.unregister(&mut descriptor).await,
                    Some(Control::Describe(reply)) => {
                        let _ = reply.send(descriptor.snapshot());
                    }
                    Some(Control::Shutdown) => break,
                    None => {
                        tracing::debug!("All service handles dropped");
                        break;
                    }
                },

                pending = connections.recv(), if accepting => match pending {
                    Some(pending) => {
                        accept_connection(&descriptor, &clients, &tracker, &handler, &settings, pending).await;
                    }
                    None => accepting = false,
                },
            }
        }

        // Later senders must never find a dead queue.
        tokio::spawn(async move {
            while let Some(event) = control.recv().await {
                tracing::trace!(?event, "Discarding control event after shutdown");
            }
        });
        drop(connections);

        lifecycle.shutdown(&mut descriptor).await;
    }
}

/// Handshake one connection and, if it succeeds, spawn its serving task.
///
/// Runs inline on the actor so handshakes stay ordered with registration
/// toggles; the handshake deadline bounds how long one client can hold it.
async fn accept_connection(
    descriptor: &ServiceDescriptor,
    clients: &ClientRegistry,
    tracker: &InFlightTracker,
    handler: &Arc<dyn RequestHandler>,
    settings: &ConnectionSettings,
    pending: PendingConnection,
) {
    let PendingConnection {
        stream,
        remote_addr,
        permit,
    } = pending;

    let client_id = clients.insert(remote_addr);
    let transport = WireTransport::new(stream, settings.max_frame_bytes);
    let registered = descriptor.is_registered();

    match handshake::perform(transport, &client_id, registered, settings.handshake_timeout).await {
        Ok(HandshakeOutcome::Established { transport, client }) => {
            metrics::record_handshake("established");
            tracing::debug!(
                client_id = %client_id,
                peer_addr = %remote_addr,
                client_name = ?client.client_name,
                "Handshake complete"
            );

            let ctx = RequestContext::new(
                client_id,
                remote_addr,
                descriptor.name().to_string(),
                clients.clone(),
            );
            let evict = settings.evict_on_close.then(|| clients.clone());
            let in_flight = tracker.track();
            let handler = Arc::clone(handler);

            tokio::spawn(async move {
                let _permit = permit;
                serve_connection(transport, ctx, handler, in_flight, evict).await;
            });
            return;
        }
        Ok(HandshakeOutcome::Rejected) => {
            metrics::record_handshake("rejected");
            tracing::debug!(client_id = %client_id, peer_addr = %remote_addr, "Rejected connection, service not registered");
        }
        Err(e) => {
            metrics::record_handshake("failed");
            tracing::warn!(client_id = %client_id, peer_addr = %remote_addr, error = %e, "Handshake failed");
        }
    }

    if settings.evict_on_close {
        clients.remove(&client_id);
    }
}
