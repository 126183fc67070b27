use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::app::SharedState;
use crate::events;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe_ws();
    // Replies meant for this client only.
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(16);

    let client_id = uuid::Uuid::new_v4().to_string();
    let welcome = events::ws_message(events::CONNECTED, json!({ "clientId": client_id }));
    if sender.send(Message::Text(welcome.into())).await.is_err() {
        return;
    }

    // Latest registration status so a fresh shell does not wait for a change.
    if let Some(coordinator) = state.coordinator() {
        let status = events::ws_payload(events::REGISTRATION_STATUS, &coordinator.status());
        if sender.send(Message::Text(status.into())).await.is_err() {
            return;
        }
    }

    tracing::info!("WebSocket client connected: {}", client_id);

    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                broadcast = rx.recv() => match broadcast {
                    Ok(msg) => msg,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket client lagging");
                        continue;
                    }
                    Err(_) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
            };
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let cid = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Some(reply) = handle_client_message(&text) {
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        tracing::info!("WebSocket client disconnected: {}", cid);
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Reply for a client message, if it needs one.
fn handle_client_message(text: &str) -> Option<String> {
    let msg: Value = serde_json::from_str(text).ok()?;
    match msg.get("type").and_then(|t| t.as_str()) {
        Some("ping") => Some(json!({ "type": events::PONG }).to_string()),
        Some(other) => {
            tracing::debug!(kind = other, "Ignoring WebSocket client message");
            None
        }
        None => None,
    }
}
