use crate::game_manager::{AppState, ConnectionId};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use shared::{ClientMessage, Position};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id = ConnectionId::new_v4();

    // Spawn a task to forward messages from the channel to the WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(connection_id = %connection_id, error = %err, "Failed to encode server message");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    state.add_connection(connection_id, tx);

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_text(&state, connection_id, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(connection_id = %connection_id, error = %err, "Transport lost");
                break;
            }
        }
    }

    // Client disconnected
    state.remove_connection(connection_id).await;
}

/// Decodes one text frame and acts on it. Unreadable frames are ignored,
/// except a `join_game` the client is waiting on an answer for.
pub(crate) async fn handle_text(state: &Arc<AppState>, connection_id: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => dispatch(state, connection_id, msg).await,
        Err(cause) if names_event(text, "join_game") => {
            let err = state.reject_join(connection_id);
            tracing::debug!(connection_id = %connection_id, error = %err, cause = %cause, "Join rejected");
        }
        Err(err) => {
            tracing::warn!(connection_id = %connection_id, error = %err, "Ignoring malformed event");
        }
    }
}

fn names_event(text: &str, event: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|frame| frame.get("event")?.as_str().map(|name| name == event))
        .unwrap_or(false)
}

async fn dispatch(state: &Arc<AppState>, connection_id: ConnectionId, msg: ClientMessage) {
    let relayed = match msg {
        ClientMessage::JoinGame { player, password } => {
            if let Err(err) = state.join_game(connection_id, player, &password).await {
                tracing::debug!(connection_id = %connection_id, error = %err, "Join rejected");
            }
            return;
        }
        ClientMessage::PlayerPosition { x, y, player } => {
            state
                .handle_position(connection_id, Position { x, y }, player)
                .await
        }
        ClientMessage::TankMove(position) => state.handle_tank_move(connection_id, position).await,
        ClientMessage::Fire(shot) => state.handle_fire(connection_id, shot).await,
    };

    if let Err(err) = relayed {
        tracing::debug!(connection_id = %connection_id, error = %err, "Event dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Identity, ServerMessage};

    fn connect(app: &AppState) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new_v4();
        app.add_connection(id, tx);
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn malformed_and_unknown_frames_are_ignored() {
        let app = Arc::new(AppState::default());
        let (conn, mut rx) = connect(&app);

        handle_text(&app, conn, "not json at all").await;
        handle_text(&app, conn, r#"{"event":"self_destruct","data":{}}"#).await;
        handle_text(&app, conn, r#"{"event":"tank_move","data":{"x":"left"}}"#).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(app.connection_count(), 1);
        assert_eq!(app.session.lock().await.registry.bound_count(), 0);
    }

    #[tokio::test]
    async fn undecodable_join_gets_auth_failed() {
        let app = Arc::new(AppState::default());
        let (conn, mut rx) = connect(&app);

        for frame in [
            r#"{"event":"join_game","data":{"player":"mallory","password":"ishu1"}}"#,
            r#"{"event":"join_game","data":{"player":"ishan"}}"#,
            r#"{"event":"join_game","data":{"player":"sakshi","password":42}}"#,
            r#"{"event":"join_game"}"#,
        ] {
            handle_text(&app, conn, frame).await;
            assert_eq!(drain(&mut rx), vec![ServerMessage::AuthFailed], "{frame}");
        }
        assert_eq!(app.session.lock().await.registry.bound_count(), 0);
    }

    #[tokio::test]
    async fn valid_join_frame_reaches_the_coordinator() {
        let app = Arc::new(AppState::default());
        let (conn, mut rx) = connect(&app);

        handle_text(&app, conn, r#"{"event":"join_game","data":{"player":"ishan","password":"nope"}}"#)
            .await;
        assert_eq!(drain(&mut rx), vec![ServerMessage::AuthFailed]);

        handle_text(&app, conn, r#"{"event":"join_game","data":{"player":"ishan","password":"ishu1"}}"#)
            .await;
        assert_eq!(drain(&mut rx), vec![ServerMessage::WaitingForOpponent]);
        assert_eq!(
            app.session.lock().await.registry.binding(Identity::Ishan),
            Some(conn)
        );
    }
}
