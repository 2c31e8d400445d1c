//! Client side of the service protocol.

use std::net::SocketAddr;

use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::protocol::{
    ClientHandshake, ClientId, CodecError, RpcError, RpcRequest, RpcResponse, ServiceHandshake,
    WireTransport,
};

const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The service answered but is not taking requests.
    #[error("service is not registered (client id {client_id})")]
    NotRegistered { client_id: ClientId },

    #[error("service closed the connection")]
    Closed,

    #[error("response id {got} does not match request id {expected}")]
    Mismatch { expected: u64, got: u64 },

    #[error("remote error: {0}")]
    Remote(#[from] RpcError),
}

/// A connection to a registered service.
pub struct ServiceClient {
    transport: WireTransport<TcpStream>,
    client_id: ClientId,
    next_id: u64,
}

impl ServiceClient {
    /// Connect and complete the handshake.
    pub async fn connect(addr: SocketAddr, hello: ClientHandshake) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let mut transport = WireTransport::new(stream, MAX_FRAME_BYTES);

        let handshake: ServiceHandshake = transport.recv().await?.ok_or(ClientError::Closed)?;
        if !handshake.registered {
            return Err(ClientError::NotRegistered {
                client_id: handshake.client_id,
            });
        }

        transport.send(&hello).await?;

        Ok(Self {
            transport,
            client_id: handshake.client_id,
            next_id: 1,
        })
    }

    /// The id the service assigned to this connection.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Call `method` and wait for its result.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        self.transport
            .send(&RpcRequest {
                id,
                method: method.to_string(),
                params,
            })
            .await?;

        let response: RpcResponse = self.transport.recv().await?.ok_or(ClientError::Closed)?;
        if response.id != id {
            return Err(ClientError::Mismatch {
                expected: id,
                got: response.id,
            });
        }

        match (response.result, response.error) {
            (_, Some(error)) => Err(error.into()),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    /// Close the connection.
    pub async fn close(self) -> Result<(), ClientError> {
        self.transport.close().await?;
        Ok(())
    }
}
