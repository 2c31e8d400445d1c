//! Per-connection serving task.

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::net::InFlightGuard;
use crate::observability::metrics;
use crate::protocol::{CodecError, RpcRequest, RpcResponse, WireTransport};
use crate::service::handler::{RequestContext, RequestHandler};
use crate::service::registry::ClientRegistry;

/// Serve requests on an established connection until the client leaves.
///
/// The in-flight guard is held for the whole call, so shutdown waits for
/// this connection. With `evict` set, the client's session is removed from
/// the registry on the way out.
pub async fn serve_connection<T>(
    mut transport: WireTransport<T>,
    ctx: RequestContext,
    handler: Arc<dyn RequestHandler>,
    _in_flight: InFlightGuard,
    evict: Option<ClientRegistry>,
) where
    T: AsyncRead + AsyncWrite + Unpin,
{
    tracing::debug!(client_id = %ctx.client_id, peer_addr = %ctx.remote_addr, "Serving connection");

    loop {
        let request = match transport.recv::<RpcRequest>().await {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!(client_id = %ctx.client_id, "Client closed connection");
                break;
            }
            Err(CodecError::Json(e)) => {
                tracing::warn!(client_id = %ctx.client_id, error = %e, "Malformed request, closing connection");
                break;
            }
            Err(e) => {
                tracing::warn!(client_id = %ctx.client_id, error = %e, "Connection read failed");
                break;
            }
        };

        let start = Instant::now();
        let result = handler.handle(&ctx, &request.method, request.params).await;
        metrics::record_request(&request.method, result.is_ok(), start);

        if let Err(e) = &result {
            tracing::debug!(
                client_id = %ctx.client_id,
                method = %request.method,
                error = %e,
                "Request failed"
            );
        }

        let response = RpcResponse::from_result(request.id, result);
        if let Err(e) = transport.send(&response).await {
            tracing::warn!(client_id = %ctx.client_id, error = %e, "Failed to write response");
            break;
        }
    }

    if let Some(clients) = evict {
        clients.remove(&ctx.client_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::InFlightTracker;
    use crate::protocol::RpcError;
    use crate::service::handler::EchoHandler;
    use serde_json::json;

    #[tokio::test]
    async fn answers_in_order_then_releases_everything() {
        let (a, b) = tokio::io::duplex(4096);
        let server = WireTransport::new(a, 4096);
        let mut client = WireTransport::new(b, 4096);

        let clients = ClientRegistry::new();
        let addr = "127.0.0.1:5555".parse().unwrap();
        let client_id = clients.insert(addr);
        let ctx = RequestContext::new(client_id.clone(), addr, "echo".into(), clients.clone());
        let tracker = InFlightTracker::new();

        let task = tokio::spawn(serve_connection(
            server,
            ctx,
            Arc::new(EchoHandler),
            tracker.track(),
            Some(clients.clone()),
        ));

        for (id, method) in [(1, "ping"), (2, "missing")] {
            client
                .send(&RpcRequest {
                    id,
                    method: method.into(),
                    params: json!(null),
                })
                .await
                .unwrap();
        }

        let first: RpcResponse = client.recv().await.unwrap().unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.result, Some(json!("pong")));

        let second: RpcResponse = client.recv().await.unwrap().unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.error.unwrap().code, RpcError::METHOD_NOT_FOUND);

        assert_eq!(tracker.active_count(), 1);
        client.close().await.unwrap();
        task.await.unwrap();

        assert_eq!(tracker.active_count(), 0);
        assert!(clients.get(&client_id).is_none());
    }
}
