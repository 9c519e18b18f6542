use shared::{Identity, ServerMessage};
use std::future::Future;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

pub type Tx = mpsc::UnboundedSender<ServerMessage>;

pub struct Connection {
    pub tx: Tx,
    pub connected_at: Instant,
}

impl Connection {
    pub fn new(tx: Tx) -> Self {
        Self {
            tx,
            connected_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{shooter} fired during {current}'s turn")]
pub struct TurnViolation {
    pub shooter: Identity,
    pub current: Identity,
}

/// A paired game between both identities. Dropping it aborts every turn
/// flip it still has pending.
pub struct Session {
    pub id: Uuid,
    pub current_turn: Identity,
    pub started_at: Instant,
    pending_flips: JoinSet<()>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            current_turn: Identity::ALL[0],
            started_at: Instant::now(),
            pending_flips: JoinSet::new(),
        }
    }

    pub fn check_turn(&self, shooter: Identity) -> Result<(), TurnViolation> {
        if shooter == self.current_turn {
            Ok(())
        } else {
            Err(TurnViolation {
                shooter,
                current: self.current_turn,
            })
        }
    }

    /// Runs `flip` on the runtime for as long as this session lives.
    pub fn schedule_flip<F>(&mut self, flip: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        while self.pending_flips.try_join_next().is_some() {}
        self.pending_flips.spawn(flip);
    }

    pub fn pending_flips(&self) -> usize {
        self.pending_flips.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Who may act right now. `NoSession` until both identities are bound.
#[derive(Default)]
pub enum TurnState {
    #[default]
    NoSession,
    Active(Session),
}

impl TurnState {
    /// Starts a fresh session and returns its id and opening turn. Any
    /// previous session is dropped along with its pending flips.
    pub fn start(&mut self) -> (Uuid, Identity) {
        let session = Session::new();
        let started = (session.id, session.current_turn);
        *self = Self::Active(session);
        started
    }

    pub fn end(&mut self) -> Option<Session> {
        match std::mem::take(self) {
            Self::Active(session) => Some(session),
            Self::NoSession => None,
        }
    }

    /// Hands the turn to `next` if `session_id` still names the live session.
    pub fn advance(&mut self, session_id: Uuid, next: Identity) -> bool {
        match self {
            Self::Active(session) if session.id == session_id => {
                session.current_turn = next;
                true
            }
            _ => false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Active(session) => Some(session),
            Self::NoSession => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match self {
            Self::Active(session) => Some(session),
            Self::NoSession => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn current_turn(&self) -> Option<Identity> {
        self.session().map(|session| session.current_turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn opening_turn_is_always_the_first_identity() {
        for _ in 0..8 {
            let mut turn = TurnState::default();
            assert_eq!(turn.current_turn(), None);
            let (_, opening) = turn.start();
            assert_eq!(opening, Identity::Ishan);
            assert_eq!(turn.current_turn(), Some(Identity::Ishan));
            assert!(turn.is_active());
        }
    }

    #[test]
    fn advance_ignores_stale_sessions() {
        let mut turn = TurnState::default();
        let (old_id, _) = turn.start();
        assert!(turn.advance(old_id, Identity::Sakshi));
        assert_eq!(turn.current_turn(), Some(Identity::Sakshi));

        let (new_id, _) = turn.start();
        assert_ne!(old_id, new_id);
        assert!(!turn.advance(old_id, Identity::Sakshi));
        assert_eq!(turn.current_turn(), Some(Identity::Ishan));

        assert!(turn.end().is_some());
        assert!(!turn.advance(new_id, Identity::Sakshi));
        assert!(turn.end().is_none());
    }

    #[test]
    fn check_turn_reports_the_holder() {
        let session = Session::new();
        assert_eq!(session.check_turn(Identity::Ishan), Ok(()));
        assert_eq!(
            session.check_turn(Identity::Sakshi),
            Err(TurnViolation {
                shooter: Identity::Sakshi,
                current: Identity::Ishan,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ending_a_session_aborts_pending_flips() {
        let fired = Arc::new(AtomicBool::new(false));
        let mut turn = TurnState::default();
        turn.start();

        let flag = Arc::clone(&fired);
        if let Some(session) = turn.session_mut() {
            session.schedule_flip(async move {
                tokio::time::sleep(Duration::from_millis(3000)).await;
                flag.store(true, Ordering::SeqCst);
            });
            assert_eq!(session.pending_flips(), 1);
        }

        drop(turn.end());
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
