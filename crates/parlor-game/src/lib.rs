//! Turn-based game engine for Parlor.
//!
//! A [`Game`] tracks seating, turn order, reconnection windows and
//! post-game cleanup. The board itself is delegated to a [`Rules`]
//! implementation, one per game kind:
//!
//! - [`TicTacToe`]: three in a row on a 3×3 grid
//! - [`ConnectFour`]: four in a row on a 6×7 grid with gravity
//! - [`Chess`]: standard chess, backed by the `shakmaty` rules engine
//!
//! The engine does no I/O and reads no clocks: callers pass `now` into
//! every time-dependent operation.
//!
//! ```
//! use std::time::Instant;
//! use parlor_game::{GameMove, GameRegistry, GameStatus, GameTimings};
//!
//! let registry = GameRegistry::standard();
//! let mut game = registry.create("tictactoe", "alice", GameTimings::default()).unwrap();
//! game.join("bob").unwrap();
//! game.make_move("alice", &GameMove::cell(1, 1), Instant::now()).unwrap();
//! assert_eq!(game.status(), GameStatus::InProgress);
//! ```

mod engine;
mod error;
mod moves;
mod registry;
pub mod rules;
mod snapshot;

pub use engine::{
    DEFAULT_CLEANUP_DELAY, DEFAULT_RECONNECT_GRACE, Departure, Game, GameTimings, TickOutcome,
};
pub use error::GameError;
pub use moves::{Coord, GameMove};
pub use registry::{GameRegistry, RulesFactory};
pub use rules::{Chess, ConnectFour, Rules, TicTacToe, Verdict};
pub use snapshot::{GameSnapshot, GameStatus};
