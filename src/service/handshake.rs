//! Connection handshake.
//!
//! ```text
//! Accepted ──send ServiceHandshake──▶ HandshakeSent
//!     registered=false ─▶ Rejected (closed, nothing read)
//!     registered=true  ─▶ AwaitingClientHandshake ──recv ClientHandshake──▶ Serving
//! ```
//!
//! Runs on the service actor, so `registered` is the flag as of the last
//! toggle the actor processed. Failures only affect the one connection.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::{ClientHandshake, ClientId, CodecError, ServiceHandshake, WireTransport};

/// Why a handshake was abandoned.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("failed to send service handshake: {0}")]
    Send(#[source] CodecError),

    #[error("failed to read client handshake: {0}")]
    Receive(#[source] CodecError),

    #[error("client closed the connection before completing the handshake")]
    Closed,

    #[error("handshake step '{0}' timed out")]
    Timeout(&'static str),
}

/// Result of a handshake that ran to completion.
#[derive(Debug)]
pub enum HandshakeOutcome<T> {
    /// The service is not registered; the connection has been closed.
    Rejected,
    /// The connection may be served.
    Established {
        transport: WireTransport<T>,
        client: ClientHandshake,
    },
}

async fn within<F: Future>(
    limit: Option<Duration>,
    step: &'static str,
    fut: F,
) -> Result<F::Output, HandshakeError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| HandshakeError::Timeout(step)),
        None => Ok(fut.await),
    }
}

/// Run the service side of the handshake for `client_id`.
pub async fn perform<T>(
    mut transport: WireTransport<T>,
    client_id: &ClientId,
    registered: bool,
    limit: Option<Duration>,
) -> Result<HandshakeOutcome<T>, HandshakeError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let hello = ServiceHandshake {
        registered,
        client_id: client_id.clone(),
    };
    within(limit, "send", transport.send(&hello))
        .await?
        .map_err(HandshakeError::Send)?;

    if !registered {
        if let Err(e) = within(limit, "close", transport.close()).await? {
            tracing::debug!(client_id = %client_id, error = %e, "Error closing rejected connection");
        }
        return Ok(HandshakeOutcome::Rejected);
    }

    let client = within(limit, "receive", transport.recv::<ClientHandshake>())
        .await?
        .map_err(HandshakeError::Receive)?
        .ok_or(HandshakeError::Closed)?;

    Ok(HandshakeOutcome::Established { transport, client })
}
