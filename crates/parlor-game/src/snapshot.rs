use serde::{Deserialize, Serialize};

use crate::GameMove;

/// Lifecycle status of a game instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Seats are still open.
    Waiting,
    /// All seats are taken and moves are accepted.
    InProgress,
    /// A seated player dropped; moves are paused until they return.
    Disconnected,
    /// Won, drawn, forfeited or timed out.
    Finished,
}

impl GameStatus {
    pub fn is_running(self) -> bool {
        matches!(self, Self::InProgress | Self::Disconnected)
    }
}

/// Owned, read-only view of a game, broadcast to room members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    pub players: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<String>,
    pub board: Vec<Vec<u8>>,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disconnected: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_moves: Vec<GameMove>,
}

impl GameSnapshot {
    /// The state shown when a room has no game.
    pub fn empty() -> Self {
        Self {
            game_name: None,
            players: Vec::new(),
            turn: None,
            board: Vec::new(),
            status: GameStatus::Waiting,
            winner: None,
            disconnected: Vec::new(),
            legal_moves: Vec::new(),
        }
    }
}
