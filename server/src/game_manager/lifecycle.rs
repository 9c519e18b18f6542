use crate::game_manager::{
    AppState, AuthError, BindOutcome, Connection, ConnectionId, SessionState, Tx,
};
use shared::{Identity, ServerMessage};

impl AppState {
    pub fn add_connection(&self, id: ConnectionId, tx: Tx) {
        tracing::info!(connection_id = %id, "Connection added to AppState");
        self.connections.insert(id, Connection::new(tx));
    }

    pub async fn join_game(
        &self,
        connection: ConnectionId,
        player: Identity,
        password: &str,
    ) -> Result<BindOutcome, AuthError> {
        if let Err(err) = self.credentials.authenticate(player, password) {
            tracing::warn!(connection_id = %connection, identity = %player, "Invalid password attempt");
            self.send_to(connection, ServerMessage::AuthFailed);
            return Err(err);
        }

        let mut state = self.session.lock().await;
        let previous = Identity::ALL.map(|identity| state.registry.binding(identity));
        let outcome = state.registry.bind(player, connection);
        tracing::info!(connection_id = %connection, identity = %player, outcome = ?outcome, "Player joined");

        match outcome {
            BindOutcome::SessionNowActive => self.start_session(&mut state),
            BindOutcome::Bound | BindOutcome::AlreadyBound { .. } => {
                if let BindOutcome::AlreadyBound { replaced } = outcome {
                    tracing::warn!(identity = %player, replaced = %replaced, "Binding taken over by a new connection");
                }
                // A connection switching identity can break an existing pair.
                if let Some(session) = state.turn.end() {
                    tracing::info!(session_id = %session.id, "Pair broken by rebinding, session torn down");
                    for stranded in previous.into_iter().flatten() {
                        if stranded != connection {
                            self.send_to(stranded, ServerMessage::OpponentDisconnected);
                        }
                    }
                }
                tracing::info!(identity = %player, "Waiting for opponent");
                self.send_to(connection, ServerMessage::WaitingForOpponent);
            }
        }

        Ok(outcome)
    }

    /// A `join_game` whose payload could not be read at all.
    pub fn reject_join(&self, connection: ConnectionId) -> AuthError {
        tracing::warn!(connection_id = %connection, "Unrecognized join attempt");
        self.send_to(connection, ServerMessage::AuthFailed);
        AuthError::UnrecognizedJoin
    }

    fn start_session(&self, state: &mut SessionState) {
        let (session_id, opening) = state.turn.start();
        tracing::info!(session_id = %session_id, start_turn = %opening, "Both players connected, starting game");

        for identity in Identity::ALL {
            if let Some(conn) = state.registry.binding(identity) {
                self.send_to(
                    conn,
                    ServerMessage::GameReady {
                        opponent: identity.opponent(),
                        start_turn: opening,
                    },
                );
            }
        }
        self.broadcast(&ServerMessage::TurnStart { player: opening });
    }

    /// Transport-level disconnect. Tears down the session if the
    /// connection was bound and tells the remaining player once.
    pub async fn remove_connection(&self, id: ConnectionId) {
        if let Some((_, conn)) = self.connections.remove(&id) {
            tracing::info!(connection_id = %id, connected_for = ?conn.connected_at.elapsed(), "Removing connection from AppState");
        }

        let mut state = self.session.lock().await;
        let Some(identity) = state.registry.unbind_connection(id) else {
            return;
        };

        if let Some(session) = state.turn.end() {
            tracing::info!(
                session_id = %session.id,
                identity = %identity,
                lasted = ?session.started_at.elapsed(),
                pending_flips = session.pending_flips(),
                "Session torn down by disconnect"
            );
        } else {
            tracing::info!(identity = %identity, "Player disconnected");
        }

        if let Some(opponent) = state.registry.opponent_of(identity) {
            tracing::info!(identity = %identity.opponent(), "Notifying opponent of disconnection");
            self.send_to(opponent, ServerMessage::OpponentDisconnected);
        }
    }
}
