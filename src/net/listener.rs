//! TCP listener with backpressure and a resilient accept loop.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections and forward them to the actor
//! - Enforce max_connections via semaphore
//! - Retry transient accept errors with backoff

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;
use crate::net::connection::PendingConnection;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting kept failing past the configured limit.
    #[error("accept failed {failures} times in a row: {source}")]
    Accept {
        failures: u32,
        #[source]
        source: std::io::Error,
    },
}

/// A bounded TCP listener that limits concurrent connections.
///
/// When the limit is reached, accepting pauses until a slot frees up.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    config: ListenerConfig,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            addr: config.bind_address.clone(),
            source,
        };

        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            bind_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            config: config.clone(),
        })
    }

    /// Accept one connection, waiting for a free slot first.
    ///
    /// Returns `Ok(None)` if the connection limit has been closed.
    async fn accept(
        &self,
    ) -> std::io::Result<Option<(TcpStream, SocketAddr, ConnectionPermit)>> {
        let Ok(permit) = self.connection_limit.clone().acquire_owned().await else {
            return Ok(None);
        };

        let (stream, addr) = self.inner.accept().await?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok(Some((stream, addr, ConnectionPermit { _permit: permit })))
    }

    /// Run the accept loop until stopped.
    ///
    /// Each accepted connection is forwarded on `connections`. The loop ends
    /// cleanly when `stop` fires or the receiving side goes away. Transient
    /// accept failures are retried with backoff; after
    /// `max_accept_failures` consecutive failures the loop gives up with
    /// [`ListenerError::Accept`].
    pub async fn run(
        self,
        connections: mpsc::UnboundedSender<PendingConnection>,
        mut stop: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let mut failures = AcceptFailures::new(&self.config);

        loop {
            let accepted = tokio::select! {
                _ = stop.recv() => {
                    tracing::debug!("Accept loop stopping");
                    return Ok(());
                }
                accepted = self.accept() => accepted,
            };

            match accepted {
                Ok(Some((stream, remote_addr, permit))) => {
                    failures.succeeded();
                    metrics::record_connection_accepted();
                    let pending = PendingConnection {
                        stream,
                        remote_addr,
                        permit,
                    };
                    if connections.send(pending).is_err() {
                        tracing::debug!("Actor gone, accept loop stopping");
                        return Ok(());
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    let delay = failures.failed(e)?;
                    tokio::select! {
                        _ = stop.recv() => return Ok(()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

/// Consecutive accept failures and the pacing of their retries.
#[derive(Debug)]
struct AcceptFailures {
    backoff: Backoff,
    limit: u32,
}

impl AcceptFailures {
    fn new(config: &ListenerConfig) -> Self {
        Self {
            backoff: Backoff::new(config.accept_backoff_base_ms, config.accept_backoff_max_ms),
            limit: config.max_accept_failures,
        }
    }

    fn succeeded(&mut self) {
        self.backoff.reset();
    }

    /// Record a failed accept. Returns the delay before the next attempt,
    /// or [`ListenerError::Accept`] once `limit` failures ran back to back.
    fn failed(&mut self, source: std::io::Error) -> Result<Duration, ListenerError> {
        let delay = self.backoff.fail();
        let failures = self.backoff.failures();
        if failures >= self.limit {
            return Err(ListenerError::Accept { failures, source });
        }

        tracing::warn!(
            error = %source,
            failures,
            delay = ?delay,
            "Accept failed, retrying"
        );
        Ok(delay)
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the slot is released back to the pool, even if the
/// connection handler panicked.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bind_address: &str, max_connections: usize) -> ListenerConfig {
        ListenerConfig {
            bind_address: bind_address.to_string(),
            max_connections,
            ..ListenerConfig::default()
        }
    }

    fn accept_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, "too many open files")
    }

    fn failure_config(limit: u32) -> ListenerConfig {
        ListenerConfig {
            max_accept_failures: limit,
            accept_backoff_base_ms: 100,
            accept_backoff_max_ms: 10_000,
            ..ListenerConfig::default()
        }
    }

    #[test]
    fn accept_gives_up_after_consecutive_failures() {
        let mut failures = AcceptFailures::new(&failure_config(3));

        let first = failures.failed(accept_error()).unwrap();
        let second = failures.failed(accept_error()).unwrap();
        assert!(second > first);

        let err = failures.failed(accept_error()).unwrap_err();
        assert!(matches!(err, ListenerError::Accept { failures: 3, .. }));
    }

    #[test]
    fn successful_accept_resets_the_backoff() {
        let mut failures = AcceptFailures::new(&failure_config(2));

        failures.failed(accept_error()).unwrap();
        failures.succeeded();

        // Back to the first step: a short delay and a fresh failure budget.
        let delay = failures.failed(accept_error()).unwrap();
        assert!(delay < Duration::from_millis(200));
        assert!(matches!(
            failures.failed(accept_error()),
            Err(ListenerError::Accept { failures: 2, .. })
        ));
    }

    #[tokio::test]
    async fn bind_conflict_is_a_bind_error() {
        let first = Listener::bind(&config("127.0.0.1:0", 4)).await.unwrap();
        let taken = first.local_addr().unwrap().to_string();

        let err = Listener::bind(&config(&taken, 4)).await.err().unwrap();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }

    #[tokio::test]
    async fn unparsable_address_is_a_bind_error() {
        let err = Listener::bind(&config("nowhere", 4)).await.err().unwrap();
        assert!(matches!(err, ListenerError::Bind { ref addr, .. } if addr == "nowhere"));
    }

    #[tokio::test]
    async fn forwards_connections_and_holds_permits() {
        let listener = Listener::bind(&config("127.0.0.1:0", 2)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let task = tokio::spawn(listener.run(tx, stop_rx));

        let _client = TcpStream::connect(addr).await.unwrap();
        let pending = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.remote_addr.ip(), addr.ip());

        stop_tx.send(()).unwrap();
        assert!(task.await.unwrap().is_ok());
    }
}
