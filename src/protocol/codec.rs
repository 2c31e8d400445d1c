//! Framed JSON transport.
//!
//! Every message is one length-prefixed frame (4-byte big-endian length)
//! holding a JSON document.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Errors raised while moving messages over a connection.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// A connection that sends and receives serde messages.
#[derive(Debug)]
pub struct WireTransport<T> {
    framed: Framed<T, LengthDelimitedCodec>,
}

impl<T> WireTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T, max_frame_bytes: usize) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(max_frame_bytes)
            .new_codec();
        Self {
            framed: Framed::new(io, codec),
        }
    }

    /// Encode and flush one message.
    pub async fn send<M: Serialize>(&mut self, message: &M) -> Result<(), CodecError> {
        let payload = serde_json::to_vec(message)?;
        self.framed.send(Bytes::from(payload)).await?;
        Ok(())
    }

    /// Read the next message. `Ok(None)` means the peer closed the connection.
    pub async fn recv<M: DeserializeOwned>(&mut self) -> Result<Option<M>, CodecError> {
        match self.framed.next().await {
            None => Ok(None),
            Some(frame) => Ok(Some(serde_json::from_slice(&frame?)?)),
        }
    }

    /// Flush pending output and shut down the write half.
    pub async fn close(mut self) -> Result<(), CodecError> {
        SinkExt::<Bytes>::close(&mut self.framed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::RpcRequest;
    use serde_json::json;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn peer_close_reads_as_none() {
        let (a, b) = tokio::io::duplex(1024);
        let mut left = WireTransport::new(a, 1024);
        let mut right = WireTransport::new(b, 1024);

        let request = RpcRequest {
            id: 7,
            method: "echo".into(),
            params: json!(["hi"]),
        };
        left.send(&request).await.unwrap();
        left.close().await.unwrap();

        assert_eq!(right.recv::<RpcRequest>().await.unwrap(), Some(request));
        assert!(right.recv::<RpcRequest>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_frame_is_an_error() {
        let (a, b) = tokio::io::duplex(4096);
        let mut big = WireTransport::new(a, 4096);
        let mut small = WireTransport::new(b, 64);

        big.send(&"x".repeat(512)).await.unwrap();
        assert!(matches!(
            small.recv::<String>().await,
            Err(CodecError::Io(_))
        ));
    }

    #[tokio::test]
    async fn garbage_payload_is_a_json_error() {
        let (mut raw, b) = tokio::io::duplex(1024);
        let mut transport = WireTransport::new(b, 1024);

        raw.write_all(&[0, 0, 0, 3]).await.unwrap();
        raw.write_all(b"{{{").await.unwrap();

        assert!(matches!(
            transport.recv::<RpcRequest>().await,
            Err(CodecError::Json(_))
        ));
    }
}
