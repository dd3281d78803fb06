//! Kind-specific board rules.
//!
//! A [`Rules`] value owns the board of one game instance. The shared
//! lifecycle (seating, turn order, disconnect timing) lives in
//! [`Game`](crate::Game), which consults its rules only for the board
//! itself.

mod chess;
mod connect_four;
mod tictactoe;

pub use chess::Chess;
pub use connect_four::ConnectFour;
pub use tictactoe::TicTacToe;

use std::fmt;

use crate::{GameError, GameMove};

/// Result of a successfully applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Play continues with the next seat.
    Continue,
    /// The player who just moved has won.
    Win,
    /// The game ended without a winner.
    Draw,
}

/// Board logic for one game kind.
///
/// Implementations must validate a move completely before touching the
/// board: an `Err` from [`apply`](Self::apply) leaves the board as it was.
pub trait Rules: Send + fmt::Debug {
    /// Wire name of the kind, e.g. `"connect4"`.
    fn name(&self) -> &'static str;

    /// Seats needed before play starts.
    fn required_players(&self) -> usize {
        2
    }

    /// Validates and applies a move for `seat` (0-based).
    fn apply(&mut self, seat: usize, mv: &GameMove) -> Result<Verdict, GameError>;

    /// Board as rows of cell codes. 0 is empty.
    fn board(&self) -> Vec<Vec<u8>>;

    /// Every move currently available to `seat`.
    fn legal_moves(&self, seat: usize) -> Vec<GameMove>;
}

/// Cell code for a seat's piece on grid boards.
pub(crate) fn seat_mark(seat: usize) -> u8 {
    seat as u8 + 1
}
