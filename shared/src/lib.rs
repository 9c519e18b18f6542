use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two fixed participants. `Ishan` comes first in the total
/// order and always opens a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    Ishan,
    Sakshi,
}

impl Identity {
    pub const ALL: [Self; 2] = [Self::Ishan, Self::Sakshi];

    pub const fn opponent(self) -> Self {
        match self {
            Self::Ishan => Self::Sakshi,
            Self::Sakshi => Self::Ishan,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Ishan => 0,
            Self::Sakshi => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ishan => "Ishan",
            Self::Sakshi => "Sakshi",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ishan => "ishan",
            Self::Sakshi => "sakshi",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

/// A shot as reported by the firing client. Relayed to the opponent as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirePayload {
    pub start_x: f64,
    pub start_y: f64,
    pub velocity: Velocity,
    pub angle: f64,
    pub power: f64,
    pub shooter: Identity,
}

/// Events sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame {
        player: Identity,
        password: String,
    },
    PlayerPosition {
        x: f64,
        y: f64,
        player: Identity,
    },
    TankMove(Position),
    Fire(FirePayload),
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    GameReady {
        opponent: Identity,
        #[serde(rename = "startTurn")]
        start_turn: Identity,
    },
    WaitingForOpponent,
    AuthFailed,
    TurnStart {
        player: Identity,
    },
    OpponentPosition(Position),
    OpponentMove(Position),
    OpponentFire(FirePayload),
    OpponentDisconnected,
}
