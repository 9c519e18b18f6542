use shared::Identity;
use uuid::Uuid;

/// Opaque handle for one live WebSocket connection.
pub type ConnectionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// First binding for this identity; the opponent is not bound yet.
    Bound,
    /// A previous connection held this identity and has been replaced.
    AlreadyBound { replaced: ConnectionId },
    /// This bind completed the pair.
    SessionNowActive,
}

/// Two-slot table mapping each identity to at most one connection.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: [Option<ConnectionId>; 2],
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, identity: Identity, connection: ConnectionId) -> BindOutcome {
        // A connection speaks for one identity only.
        if let Some(other) = self.identity_of(connection) {
            if other != identity {
                self.slots[other.index()] = None;
            }
        }

        let previous = self.slots[identity.index()].replace(connection);

        if self.is_paired() {
            BindOutcome::SessionNowActive
        } else {
            match previous {
                Some(replaced) if replaced != connection => BindOutcome::AlreadyBound { replaced },
                _ => BindOutcome::Bound,
            }
        }
    }

    /// Clears the binding for `identity`. Returns whether anything was removed.
    pub fn unbind(&mut self, identity: Identity) -> bool {
        self.slots[identity.index()].take().is_some()
    }

    /// Clears the binding only if it still points at `connection`, so a
    /// displaced connection cannot drop its replacement.
    pub fn unbind_connection(&mut self, connection: ConnectionId) -> Option<Identity> {
        let identity = self.identity_of(connection)?;
        self.slots[identity.index()] = None;
        Some(identity)
    }

    pub fn binding(&self, identity: Identity) -> Option<ConnectionId> {
        self.slots[identity.index()]
    }

    pub fn opponent_of(&self, identity: Identity) -> Option<ConnectionId> {
        self.binding(identity.opponent())
    }

    pub fn identity_of(&self, connection: ConnectionId) -> Option<Identity> {
        Identity::ALL
            .into_iter()
            .find(|identity| self.slots[identity.index()] == Some(connection))
    }

    pub fn is_paired(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
