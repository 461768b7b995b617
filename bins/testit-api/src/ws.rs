//! WebSocket gateway: bridges one connection to the engine's session
//! registry. The registry owns all process/workspace lifecycle; this module
//! only translates frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use testit_common::protocol::{ClientMessage, ServerEvent, StreamKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, "Client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Engine events out to the wire.
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Failed to encode server event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Client frames in.
    while let Some(frame) = ws_rx.next().await {
        let message = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        match serde_json::from_str::<ClientMessage>(&message) {
            Ok(ClientMessage::RunCode { code, language }) => {
                state
                    .registry
                    .start_run(conn_id, code, language, event_tx.clone())
                    .await;
            }
            Ok(ClientMessage::Input { data }) => {
                state.registry.push_input(conn_id, &data);
            }
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "Unparseable client message");
                let _ = event_tx.send(ServerEvent::Output {
                    kind: StreamKind::Error,
                    data: format!("Unrecognized message: {}", e),
                });
            }
        }
    }

    // Transport teardown is the implicit cancellation signal.
    state.registry.disconnect(conn_id);
    writer.abort();
    info!(conn_id = %conn_id, "Client disconnected");
}
