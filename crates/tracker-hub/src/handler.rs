//! WebSocket endpoint driving one socket through the hub

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, HeaderMap},
    response::Response,
};

use crate::connection::ConnectionMetadata;
use crate::hub::BroadcastHub;

/// Upgrade endpoint, mounted at `/ws` by the application
pub async fn ws_connect(
    State(hub): State<BroadcastHub>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let metadata = ConnectionMetadata::new(client_ip, user_agent);
    ws.on_upgrade(move |socket| serve_socket(socket, hub, metadata))
}

/// Pump frames between one socket and the hub until either side goes away
pub async fn serve_socket(mut socket: WebSocket, hub: BroadcastHub, metadata: ConnectionMetadata) {
    let (handle, mut outbound) = hub.register(metadata);

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    // The hub dropped this connection; tell the client so it reconnects
                    tracing::debug!(connection_id = %handle.id, "Connection dropped by hub, closing socket");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                    tracing::debug!(connection_id = %handle.id, "Socket write failed");
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => hub.handle_incoming(&handle, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => {
                        handle.mark_closing();
                        break;
                    }
                    // Binary frames carry nothing we understand; ping/pong is handled by axum
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %handle.id, error = %e, "Socket transport error");
                        break;
                    }
                }
            }
        }
    }

    hub.unregister(&handle);
}
