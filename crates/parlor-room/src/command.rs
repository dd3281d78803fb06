//! The `game_state` request payload.

use parlor_game::GameMove;
use serde::Deserialize;

use crate::RoomError;

/// What a member asked the room's game to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Get,
    Create,
    Join,
    Move,
    Leave,
}

impl GameAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "create" => Some(Self::Create),
            "join" => Some(Self::Join),
            "move" => Some(Self::Move),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }
}

/// `{action, gameName?, move?}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCommand {
    pub action: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default, rename = "move")]
    pub game_move: Option<GameMove>,
}

impl GameCommand {
    pub fn action(&self) -> Result<GameAction, RoomError> {
        GameAction::from_name(&self.action)
            .ok_or_else(|| RoomError::UnknownAction(self.action.clone()))
    }
}
