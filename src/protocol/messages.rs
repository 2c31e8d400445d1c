//! Wire message types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier assigned to a client for the lifetime of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First message on every connection, sent by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHandshake {
    /// Whether the service is accepting requests. When false the service
    /// closes the connection right after this message.
    pub registered: bool,
    pub client_id: ClientId,
}

/// Reply from the client, read only when the service is registered.
///
/// The contents belong to the application; the service only requires that
/// one well-formed message arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientHandshake {
    /// Name of the calling application, if it cares to say.
    pub client_name: Option<String>,
    pub metadata: HashMap<String, Value>,
}

/// A request frame on an established connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Error reported by a request handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("unknown method '{method}'"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }
}

/// The answer to an [`RpcRequest`] with the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn from_result(id: u64, result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(value) => Self {
                id,
                result: Some(value),
                error: None,
            },
            Err(error) => Self {
                id,
                result: None,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_handshake_uses_camel_case() {
        let handshake = ServiceHandshake {
            registered: true,
            client_id: ClientId::from("abc".to_string()),
        };
        let encoded = serde_json::to_value(&handshake).unwrap();
        assert_eq!(encoded, json!({ "registered": true, "clientId": "abc" }));
    }

    #[test]
    fn client_handshake_accepts_empty_object() {
        let handshake: ClientHandshake = serde_json::from_value(json!({})).unwrap();
        assert_eq!(handshake, ClientHandshake::default());
    }

    #[test]
    fn response_carries_either_result_or_error() {
        let ok = serde_json::to_value(RpcResponse::from_result(1, Ok(json!(5)))).unwrap();
        assert_eq!(ok, json!({ "id": 1, "result": 5 }));

        let err = RpcResponse::from_result(2, Err(RpcError::method_not_found("nope")));
        let encoded = serde_json::to_value(err).unwrap();
        assert_eq!(encoded["error"]["code"], json!(RpcError::METHOD_NOT_FOUND));
        assert!(encoded.get("result").is_none());
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(ClientId::generate(), ClientId::generate());
    }
}
