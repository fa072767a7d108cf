pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::protocol::{ClientMessage, GameEvent, GameEventKind};
use crate::state::AppState;
use crate::types::{ParticipantId, Role, SessionId};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
    pub session_id: Option<SessionId>,
    pub participant_id: Option<ParticipantId>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: role={:?}, session={:?}",
        params.role,
        params.session_id
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let role = match params.role.as_deref() {
        Some("admin") => Role::Admin,
        _ => Role::Player,
    };
    let mut session_id = params.session_id;
    let participant_id = params.participant_id;

    tracing::info!("WebSocket connected with role: {:?}", role);

    // Subscribe to the session's event stream if one was named. Admins who
    // connect before creating a session subscribe once the session exists.
    let mut events_rx: Option<broadcast::Receiver<GameEvent>> = match &session_id {
        Some(id) => match state.subscribe(id).await {
            Ok(rx) => Some(rx),
            Err(err) => {
                let event = GameEvent::now(id.clone(), GameEventKind::error(&err));
                if let Ok(json) = serde_json::to_string(&event) {
                    let _ = sender.send(Message::Text(json.into())).await;
                }
                return;
            }
        },
        None => None,
    };

    // Reconnect snapshot for clients that name a session up front
    if let Some(id) = &session_id {
        if let Ok((session, participants, current_round)) = state.session_state(id).await {
            let snapshot = GameEvent::now(
                id.clone(),
                GameEventKind::SessionState {
                    session,
                    participants,
                    current_round,
                },
            );
            if let Ok(json) = serde_json::to_string(&snapshot) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }
        }
    }

    loop {
        tokio::select! {
            // Session broadcasts
            event = async {
                match &mut events_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Not attached to a session yet: wait forever
                        std::future::pending::<Option<GameEvent>>().await
                    }
                }
            } => {
                if let Some(event) = event {
                    if let Ok(json) = serde_json::to_string(&event) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }

            // Client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &role, &state).await
                                {
                                    // First successful command binds this
                                    // socket to its session's stream.
                                    let is_error =
                                        matches!(response.kind, GameEventKind::Error { .. });
                                    if events_rx.is_none() && !is_error {
                                        if let Ok(rx) =
                                            state.subscribe(&response.session_id).await
                                        {
                                            session_id = Some(response.session_id.clone());
                                            events_rx = Some(rx);
                                        }
                                    }

                                    if let Ok(json) = serde_json::to_string(&response) {
                                        if sender.send(Message::Text(json.into())).await.is_err() {
                                            tracing::error!("Failed to send response");
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = GameEvent::now(
                                    session_id.clone().unwrap_or_default(),
                                    GameEventKind::Error {
                                        code: "PARSE_ERROR".to_string(),
                                        msg: format!("Invalid message format: {}", e),
                                    },
                                );
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // A dropped player socket flips its participant to disconnected; missed
    // events are recovered via GetSession on reconnect.
    if let (Some(session_id), Some(participant_id)) = (&session_id, &participant_id) {
        state.mark_disconnected(session_id, participant_id).await;
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}
