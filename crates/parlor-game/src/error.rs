//! Error types for the game engine.

/// Errors returned by game operations.
///
/// Every variant is a rule violation reported back to the player who
/// triggered it. A call that returns an error never mutates the game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Moves are only accepted while the game is in progress.
    #[error("game is not in progress")]
    NotInProgress,

    /// The caller is not seated in this game.
    #[error("player {0} is not part of this game")]
    NotAPlayer(String),

    /// The caller is seated but it is the other player's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The move failed kind-specific validation.
    ///
    /// The reason is the short text shown to the player, e.g.
    /// `"invalid move"` or `"cell already taken"`.
    #[error("{0}")]
    IllegalMove(String),

    /// Every seat is taken.
    #[error("game is full")]
    Full,

    /// The player already holds a seat.
    #[error("player {0} already joined")]
    AlreadyJoined(String),

    /// A seated player dropped and the game is waiting for them.
    #[error("game is paused waiting for a player to reconnect")]
    PausedForReconnect,

    /// The game has ended and accepts no new players.
    #[error("game is already finished")]
    Finished,

    /// No rule set is registered under this name.
    #[error("game type not supported: {0}")]
    UnsupportedGame(String),
}

impl GameError {
    pub(crate) fn illegal(reason: impl Into<String>) -> Self {
        Self::IllegalMove(reason.into())
    }
}
