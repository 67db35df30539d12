// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket endpoint for real-time notification delivery.
//!
//! `GET /ws?user_id=<id>` upgrades and joins the socket to the session
//! registry. Server -> client frames are JSON:
//! ```json
//! {"event": "notification", "data": {"id": "...", "type": "LIKE", ...}}
//! ```
//! Client frames are ignored; the socket exists to receive pushes.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use plexus_core::PlexusError;
use serde::Deserialize;

use crate::handlers::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    user_id: String,
}

/// Upgrade to a WebSocket for a known user.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<GatewayState>,
) -> Response {
    match state.engine.storage().get_user(&params.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiError::from(PlexusError::Authorization("unknown user".to_string()))
                .into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id))
}

/// Forward registry frames to the socket until either side closes.
async fn handle_socket(socket: WebSocket, state: GatewayState, user_id: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (session_id, mut rx) = state.registry.open_session(&user_id);

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    state.registry.leave(&user_id, &session_id);
    sender_task.abort();
}
