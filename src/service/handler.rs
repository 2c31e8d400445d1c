//! Request handling seam.

use std::net::SocketAddr;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::protocol::{ClientId, RpcError};
use crate::service::registry::{ClientRegistry, ClientSession};

/// Who a request came from.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub client_id: ClientId,
    pub remote_addr: SocketAddr,
    pub service_name: String,
    clients: ClientRegistry,
}

impl RequestContext {
    pub(crate) fn new(
        client_id: ClientId,
        remote_addr: SocketAddr,
        service_name: String,
        clients: ClientRegistry,
    ) -> Self {
        Self {
            client_id,
            remote_addr,
            service_name,
            clients,
        }
    }

    /// The registry entry for the calling client.
    pub fn session(&self) -> Option<ClientSession> {
        self.clients.get(&self.client_id)
    }
}

/// Application code invoked for every request on an established connection.
///
/// Requests on one connection are handled in order; connections are
/// handled concurrently.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        ctx: &RequestContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError>;
}

/// Built-in handler answering `ping`, `echo` and `whoami`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

#[async_trait]
impl RequestHandler for EchoHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        match method {
            "ping" => Ok(json!("pong")),
            "echo" if params.is_null() => Err(RpcError::invalid_params("echo needs params")),
            "echo" => Ok(params),
            "whoami" => Ok(json!({
                "clientId": ctx.client_id,
                "remoteAddr": ctx.remote_addr.to_string(),
                "service": ctx.service_name,
            })),
            other => Err(RpcError::method_not_found(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(clients: &ClientRegistry) -> RequestContext {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let client_id = clients.insert(addr);
        RequestContext::new(client_id, addr, "echo".into(), clients.clone())
    }

    #[tokio::test]
    async fn echo_methods() {
        let clients = ClientRegistry::new();
        let ctx = context(&clients);

        assert_eq!(
            EchoHandler.handle(&ctx, "ping", Value::Null).await.unwrap(),
            json!("pong")
        );
        assert_eq!(
            EchoHandler.handle(&ctx, "echo", json!([1, 2])).await.unwrap(),
            json!([1, 2])
        );
        let err = EchoHandler.handle(&ctx, "echo", Value::Null).await.unwrap_err();
        assert_eq!(err.code, RpcError::INVALID_PARAMS);

        let err = EchoHandler.handle(&ctx, "nope", Value::Null).await.unwrap_err();
        assert_eq!(err.code, RpcError::METHOD_NOT_FOUND);
    }

    #[test]
    fn context_reads_session_from_registry() {
        let clients = ClientRegistry::new();
        let ctx = context(&clients);
        assert_eq!(ctx.session().unwrap().client_id, ctx.client_id);

        clients.remove(&ctx.client_id);
        assert!(ctx.session().is_none());
    }
}
