//! services/api/src/web/ws_handler.rs
//!
//! Pushes the active session's timer to the browser once per second and accepts
//! pause/resume commands on the same connection.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New timer WebSocket connection established.");

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));
    let token = CancellationToken::new();

    // --- 1. Ticker ---
    let ticker = {
        let app_state = app_state.clone();
        let ws_sender = ws_sender.clone();
        let token = token.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let msg = current_tick(&app_state).await;
                        if send_message(&ws_sender, &msg).await.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    };

    // --- 2. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::ToggleTimer) => {
                    let now = Utc::now();
                    let reply = match app_state
                        .apply(|store| Ok(store.active_mut()?.toggle_timer(now)))
                        .await
                    {
                        Ok(running) => {
                            info!(running, "Session timer toggled.");
                            current_tick(&app_state).await
                        }
                        Err((_, message)) => ServerMessage::Error { message },
                    };
                    if send_message(&ws_sender, &reply).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Unrecognised client message: {}", e);
                    let reply = ServerMessage::Error {
                        message: format!("Unrecognised message: {}", e),
                    };
                    if send_message(&ws_sender, &reply).await.is_err() {
                        break;
                    }
                }
            },
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 3. Cleanup ---
    token.cancel();
    if let Err(e) = ticker.await {
        error!("Timer task ended abnormally: {:?}", e);
    }
    info!("Timer WebSocket connection closed.");
}

async fn current_tick(app_state: &AppState) -> ServerMessage {
    let store = app_state.store.read().await;
    match store.active() {
        Some(active) => ServerMessage::Tick {
            session_id: active.session().id,
            elapsed_seconds: active.elapsed_seconds(Utc::now()),
            running: active.is_running(),
        },
        None => ServerMessage::NoActiveSession,
    }
}

async fn send_message(ws_sender: &WsSender, msg: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
}
