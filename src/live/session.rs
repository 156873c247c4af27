use crate::live::registry::SessionRegistry;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tracing::{debug, info};

/// Runs one live session from upgrade to teardown: a write loop draining the session's
/// queue and a read loop discarding inbound frames. Whichever ends first takes the other
/// down, and the session leaves the registry.
pub async fn run(socket: WebSocket, registry: SessionRegistry) {
    let (id, mut outbound) = registry.register().await;
    let (mut ws_sink, mut ws_stream) = socket.split();

    let mut write_loop = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame)).await {
                debug!("Error writing to WebSocket: {}", e);
                return;
            }
        }
        // Queue closed by the registry: the session was evicted.
        let _ = ws_sink.send(Message::Close(None)).await;
    });

    let mut read_loop = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    // No inbound commands exist yet.
                    if let Err(e) = serde_json::from_str::<Value>(text.as_str()) {
                        debug!("Error parsing WebSocket message: {}", e);
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Error reading from WebSocket: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut write_loop => read_loop.abort(),
        _ = &mut read_loop => write_loop.abort(),
    }

    registry.remove(id).await;
    info!(session = %id, "Session closed");
}
