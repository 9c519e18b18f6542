use crate::game_manager::{AppState, ConnectionId, SessionRegistry, TurnViolation};
use shared::{FirePayload, Identity, Position, ServerMessage};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("connection has not joined the game")]
    NotJoined,
    #[error("event claims {declared} but the connection is bound to {bound}")]
    IdentityMismatch { declared: Identity, bound: Identity },
    #[error("{0} has no opponent bound")]
    NoOpponent(Identity),
    #[error("no active session")]
    NoSession,
    #[error(transparent)]
    Turn(#[from] TurnViolation),
}

/// The identity a connection speaks for. A declared identity must agree
/// with the binding.
fn resolve_sender(
    registry: &SessionRegistry,
    connection: ConnectionId,
    declared: Option<Identity>,
) -> Result<Identity, RelayError> {
    let bound = registry
        .identity_of(connection)
        .ok_or(RelayError::NotJoined)?;
    match declared {
        Some(declared) if declared != bound => Err(RelayError::IdentityMismatch { declared, bound }),
        _ => Ok(bound),
    }
}

impl AppState {
    fn relay_to_opponent(
        &self,
        registry: &SessionRegistry,
        sender: Identity,
        msg: ServerMessage,
    ) -> Result<(), RelayError> {
        let opponent = registry
            .opponent_of(sender)
            .ok_or(RelayError::NoOpponent(sender))?;
        self.send_to(opponent, msg);
        Ok(())
    }

    pub async fn handle_position(
        &self,
        connection: ConnectionId,
        position: Position,
        player: Identity,
    ) -> Result<(), RelayError> {
        let state = self.session.lock().await;
        let sender = resolve_sender(&state.registry, connection, Some(player))?;
        tracing::trace!(identity = %sender, x = position.x, y = position.y, "Player position received");
        self.relay_to_opponent(&state.registry, sender, ServerMessage::OpponentPosition(position))
    }

    pub async fn handle_tank_move(
        &self,
        connection: ConnectionId,
        position: Position,
    ) -> Result<(), RelayError> {
        let state = self.session.lock().await;
        let sender = resolve_sender(&state.registry, connection, None)?;
        self.relay_to_opponent(&state.registry, sender, ServerMessage::OpponentMove(position))
    }

    /// Forwards the shot immediately and schedules the turn to pass to the
    /// opponent once the configured delay has elapsed.
    pub async fn handle_fire(
        self: &Arc<Self>,
        connection: ConnectionId,
        shot: FirePayload,
    ) -> Result<(), RelayError> {
        let mut state = self.session.lock().await;
        let shooter = resolve_sender(&state.registry, connection, Some(shot.shooter))?;

        if self.config.enforce_turns {
            let session = state.turn.session().ok_or(RelayError::NoSession)?;
            session.check_turn(shooter)?;
        }

        tracing::info!(shooter = %shooter, angle = shot.angle, power = shot.power, "Fire event received");
        let relayed =
            self.relay_to_opponent(&state.registry, shooter, ServerMessage::OpponentFire(shot));

        if let Some(session) = state.turn.session_mut() {
            let app = Arc::clone(self);
            let session_id = session.id;
            let delay = self.config.turn_delay();
            session.schedule_flip(async move {
                tokio::time::sleep(delay).await;
                app.advance_turn(session_id, shooter.opponent()).await;
            });
        }

        relayed
    }

    async fn advance_turn(&self, session_id: Uuid, next: Identity) {
        let mut state = self.session.lock().await;
        if state.turn.advance(session_id, next) {
            tracing::info!(session_id = %session_id, player = %next, "Starting next turn");
            self.broadcast(&ServerMessage::TurnStart { player: next });
        } else {
            tracing::debug!(session_id = %session_id, "Session gone, skipping turn flip");
        }
    }
}
