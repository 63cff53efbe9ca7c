//! Websocket feed of post-mutation events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use shared::entity::users;
use shared::{Event, Role};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Admins see every event, everyone else only their own
pub fn should_deliver(event: &Event, user_id: i64, is_admin: bool) -> bool {
    is_admin || event.user_id() == user_id
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let user = state.authenticate(&query.token).await?;
    Ok(ws.on_upgrade(move |socket| stream_events(socket, state, user)))
}

async fn stream_events(mut socket: WebSocket, state: AppState, user: users::Model) {
    let is_admin = user.role == Role::Admin.as_str();
    let mut events = state.notifier.subscribe();
    info!("🔌 Websocket connected for user {}", user.id);

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if !should_deliver(&event, user.id, is_admin) {
                        continue;
                    }
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Websocket for user {} lagged, skipped {} events", user.id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Websocket error for user {}: {}", user.id, e);
                    break;
                }
            },
        }
    }

    info!("Websocket closed for user {}", user.id);
}
