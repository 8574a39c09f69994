//! WebSocket endpoint streaming realtime events to a client session.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use super::events::RealtimeMessage;
use crate::auth::tokens;
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/realtime", get(connect))
}

#[derive(Debug, Deserialize)]
struct ConnectParams {
    /// Single-use ticket minted at login.
    ticket: String,
}

async fn connect(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> Result<Response, ApiError> {
    let data = tokens::consume_ws_ticket(state.kv.as_ref(), &params.ticket)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired realtime ticket"))?;

    Ok(ws.on_upgrade(move |socket| session(socket, state, data.user_id)))
}

/// Pump broadcast events whose audience includes this user to the socket
/// until the client goes away.
async fn session(socket: WebSocket, state: AppState, user_id: String) {
    let mut rx = state.broadcast.subscribe();
    let (mut sink, mut stream) = socket.split();

    tracing::debug!(%user_id, "realtime session opened");

    loop {
        tokio::select! {
            event = rx.recv() => {
                let payload = match event {
                    Ok(payload) => payload,
                    // Dropped events are acceptable: events are hints, the
                    // client re-reads authoritative state over HTTP.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%user_id, skipped, "realtime session lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if !payload.audience.includes(&user_id) {
                    continue;
                }

                let msg = RealtimeMessage {
                    t: payload.event_name.clone(),
                    d: payload.data.clone(),
                };
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::error!(?err, "failed to serialize realtime message");
                        continue;
                    }
                };

                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // client pings and stray frames
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::debug!(%user_id, "realtime session closed");
}
