//! Wire protocol.
//!
//! # Data Flow
//! ```text
//! service → client   ServiceHandshake {registered, clientId}
//!   (registered=false: connection closed here)
//! client  → service  ClientHandshake {..}
//! client  → service  RpcRequest {id, method, params}   ┐ repeated until
//! service → client   RpcResponse {id, result | error}  ┘ the client closes
//! ```
//!
//! # Design Decisions
//! - Length-delimited frames carrying JSON (codec.rs)
//! - Message types are plain serde structs (messages.rs)

pub mod codec;
pub mod messages;

pub use codec::{CodecError, WireTransport};
pub use messages::{
    ClientHandshake, ClientId, RpcError, RpcRequest, RpcResponse, ServiceHandshake,
};
