use crate::config::ServerConfig;
use dashmap::DashMap;
use shared::ServerMessage;
use tokio::sync::Mutex;

pub mod auth;
pub mod lifecycle;
pub mod registry;
pub mod relay;
pub mod session;

pub use auth::{AuthError, CredentialTable};
pub use registry::{BindOutcome, ConnectionId, SessionRegistry};
pub use relay::RelayError;
pub use session::{Connection, Session, TurnState, TurnViolation, Tx};

/// Bindings and turn state, always mutated together under one lock so
/// `turn` is active exactly when `registry` is paired.
#[derive(Default)]
pub struct SessionState {
    pub registry: SessionRegistry,
    pub turn: TurnState,
}

/// The session manager shared by every connection handler.
pub struct AppState {
    pub config: ServerConfig,
    pub credentials: CredentialTable,
    pub connections: DashMap<ConnectionId, Connection>,
    pub session: Mutex<SessionState>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            credentials: CredentialTable::from_config(&config),
            config,
            connections: DashMap::new(),
            session: Mutex::new(SessionState::default()),
        }
    }

    pub(crate) fn send_to(&self, connection: ConnectionId, msg: ServerMessage) -> bool {
        match self.connections.get(&connection) {
            Some(conn) => conn.tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Delivers `msg` to every live connection, joined or not.
    pub(crate) fn broadcast(&self, msg: &ServerMessage) {
        for conn in self.connections.iter() {
            let _ = conn.tx.send(msg.clone());
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
