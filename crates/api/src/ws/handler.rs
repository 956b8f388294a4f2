use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use nephra_core::error::CoreError;
use nephra_core::roles::LAB_ALERT_ROLES;
use nephra_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::manager::{role_topic, WsManager};

/// Auth parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    /// Bearer token passed as `?token=`; the `Authorization` header is
    /// accepted as an alternative.
    pub token: Option<String>,
}

/// Messages a client may send after connecting.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Subscribe to an additional named topic.
    JoinRoom { room: String },
    /// Unsubscribe from a named topic.
    LeaveRoom { room: String },
    /// Live dialysis session data; relayed to the clinical role topics.
    SessionUpdate {
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// An ML prediction became available; relayed to the clinical role topics.
    PredictionReady {
        #[serde(default)]
        payload: serde_json::Value,
    },
}

/// HTTP handler that authenticates and upgrades the connection to WebSocket.
///
/// The bearer credential is verified and decoded *before* the upgrade is
/// accepted: a missing or invalid token terminates the attempt with 401 and
/// no connection state is created.
pub async fn ws_handler(
    Query(params): Query<WsAuthParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let token = params
        .token
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing channel credential".into()))
        })?;

    let claims = validate_token(&token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state.ws_manager, claims.sub, claims.role)
    }))
}

/// Manage a single authenticated WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager` (auto-subscribing the
///      per-user and per-role topics) and sends the welcome payload.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound messages on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user_id: DbId, role: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, role = %role, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = ws_manager.add(conn_id.clone(), user_id, &role).await;

    let (mut sink, mut stream) = socket.split();

    // Welcome payload, sent before the forwarding task takes over the sink.
    let welcome = serde_json::json!({
        "message": "Connected to nephra real-time channel",
        "userId": user_id,
        "role": role,
    });
    if sink.send(Message::Text(welcome.to_string().into())).await.is_err() {
        ws_manager.remove(&conn_id).await;
        return;
    }

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                handle_client_message(&ws_manager, &conn_id, user_id, text.as_str()).await;
            }
            Ok(_other) => {
                // Binary/Ping frames carry no protocol meaning here.
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: drop all subscriptions and abort sender task.
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

/// Dispatch a single inbound client message.
async fn handle_client_message(ws_manager: &WsManager, conn_id: &str, user_id: DbId, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Unparseable client message");
            return;
        }
    };

    match message {
        ClientMessage::JoinRoom { room } => {
            ws_manager.join_topic(conn_id, &room).await;
            tracing::debug!(conn_id = %conn_id, room = %room, "Joined room");
        }
        ClientMessage::LeaveRoom { room } => {
            ws_manager.leave_topic(conn_id, &room).await;
            tracing::debug!(conn_id = %conn_id, room = %room, "Left room");
        }
        ClientMessage::SessionUpdate { payload } => {
            relay_to_clinical_roles(ws_manager, conn_id, user_id, "session_update", payload).await;
        }
        ClientMessage::PredictionReady { payload } => {
            relay_to_clinical_roles(ws_manager, conn_id, user_id, "prediction_ready", payload)
                .await;
        }
    }
}

/// Relay a domain event to the clinical role topics, excluding the sender.
async fn relay_to_clinical_roles(
    ws_manager: &WsManager,
    sender_conn_id: &str,
    sender_user_id: DbId,
    event_type: &str,
    payload: serde_json::Value,
) {
    let message = serde_json::json!({
        "type": event_type,
        "from": sender_user_id,
        "payload": payload,
    });
    let topics: Vec<String> = LAB_ALERT_ROLES.iter().map(|role| role_topic(role)).collect();
    let delivered = ws_manager
        .send_to_topics(
            &topics,
            Some(sender_conn_id),
            Message::Text(message.to_string().into()),
        )
        .await;
    tracing::debug!(event_type, delivered, "Relayed event to clinical role topics");
}
