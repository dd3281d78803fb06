//! Shared game lifecycle: seating, turns, disconnects and cleanup.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::rules::{Rules, Verdict};
use crate::{GameError, GameMove, GameSnapshot, GameStatus};

/// How long a dropped player may take to come back.
pub const DEFAULT_RECONNECT_GRACE: Duration = Duration::from_secs(30);

/// How long a finished game stays attached to its room.
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(10);

/// Time limits applied by [`Game::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTimings {
    pub reconnect_grace: Duration,
    pub cleanup_delay: Duration,
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            reconnect_grace: DEFAULT_RECONNECT_GRACE,
            cleanup_delay: DEFAULT_CLEANUP_DELAY,
        }
    }
}

/// What [`Game::leave`] did with the departing player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Kept in their seat; the reconnection window is open.
    Paused,
    /// Removed, other players remain.
    Removed,
    /// Removed and nobody is left. The game should be detached.
    Emptied,
}

/// Result of a periodic [`Game::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed.
    Idle,
    /// A reconnection window expired and the game was finished.
    Broadcast,
    /// The game has been finished longer than the cleanup delay.
    Expired,
}

/// One running game.
///
/// All time-dependent operations take `now` so callers decide which
/// clock drives the game.
#[derive(Debug)]
pub struct Game {
    rules: Box<dyn Rules>,
    players: Vec<String>,
    turn: usize,
    status: GameStatus,
    winner: Option<String>,
    disconnected: HashMap<String, Instant>,
    ended_at: Option<Instant>,
    timings: GameTimings,
}

impl Game {
    /// Creates a game with `creator` in the first seat.
    pub fn new(rules: Box<dyn Rules>, creator: &str, timings: GameTimings) -> Self {
        let mut game = Self {
            rules,
            players: Vec::new(),
            turn: 0,
            status: GameStatus::Waiting,
            winner: None,
            disconnected: HashMap::new(),
            ended_at: None,
            timings,
        };
        game.seat(creator);
        game
    }

    pub fn name(&self) -> &'static str {
        self.rules.name()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Player whose move it is, while the game is running.
    pub fn current_player(&self) -> Option<&str> {
        if !self.status.is_running() {
            return None;
        }
        self.players.get(self.turn).map(String::as_str)
    }

    pub fn is_player(&self, player: &str) -> bool {
        self.seat_of(player).is_some()
    }

    /// Whether `player` dropped and has not come back yet.
    pub fn is_disconnected(&self, player: &str) -> bool {
        self.disconnected.contains_key(player)
    }

    /// Takes a free seat.
    pub fn join(&mut self, player: &str) -> Result<(), GameError> {
        match self.status {
            GameStatus::Finished => return Err(GameError::Finished),
            GameStatus::Disconnected => return Err(GameError::PausedForReconnect),
            GameStatus::Waiting | GameStatus::InProgress => {}
        }
        if self.is_player(player) {
            return Err(GameError::AlreadyJoined(player.to_owned()));
        }
        if self.players.len() >= self.rules.required_players() {
            return Err(GameError::Full);
        }
        self.seat(player);
        Ok(())
    }

    /// Clears a pending disconnect. Returns `false` if `player` was not
    /// waiting to reconnect.
    pub fn rejoin(&mut self, player: &str) -> bool {
        if self.disconnected.remove(player).is_none() {
            return false;
        }
        if self.disconnected.is_empty() && self.status == GameStatus::Disconnected {
            self.status = GameStatus::InProgress;
            info!(game = self.name(), %player, "player reconnected, game resumed");
        }
        true
    }

    /// Handles a player leaving.
    ///
    /// A network drop during play keeps the seat and starts the
    /// reconnection window. Anything else frees the seat; walking out of
    /// a running game forfeits it.
    pub fn leave(
        &mut self,
        player: &str,
        intentional: bool,
        now: Instant,
    ) -> Result<Departure, GameError> {
        let seat = self
            .seat_of(player)
            .ok_or_else(|| GameError::NotAPlayer(player.to_owned()))?;

        if self.status.is_running() && !intentional {
            self.disconnected.entry(player.to_owned()).or_insert(now);
            self.status = GameStatus::Disconnected;
            debug!(game = self.name(), %player, "player dropped, holding seat");
            return Ok(Departure::Paused);
        }

        let was_running = self.status.is_running();
        let full_roster = self.players.len() == self.rules.required_players();
        self.players.remove(seat);
        self.disconnected.remove(player);

        if was_running {
            let winner = if full_roster { self.players.first().cloned() } else { None };
            self.finish(now, winner);
        } else if self.turn >= self.players.len() {
            self.turn = 0;
        }

        Ok(if self.players.is_empty() {
            Departure::Emptied
        } else {
            Departure::Removed
        })
    }

    /// Validates and applies a move.
    pub fn make_move(
        &mut self,
        player: &str,
        mv: &GameMove,
        now: Instant,
    ) -> Result<(), GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        let seat = self
            .seat_of(player)
            .ok_or_else(|| GameError::NotAPlayer(player.to_owned()))?;
        if seat != self.turn {
            return Err(GameError::NotYourTurn);
        }

        match self.rules.apply(seat, mv)? {
            Verdict::Continue => self.turn = (self.turn + 1) % self.players.len(),
            Verdict::Win => self.finish(now, Some(player.to_owned())),
            Verdict::Draw => self.finish(now, None),
        }
        Ok(())
    }

    /// Checks the reconnection window and the cleanup delay.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.status == GameStatus::Disconnected {
            let grace = self.timings.reconnect_grace;
            let timed_out = self
                .disconnected
                .values()
                .any(|&since| now.saturating_duration_since(since) > grace);
            if timed_out {
                let connected: Vec<&String> = self
                    .players
                    .iter()
                    .filter(|p| !self.disconnected.contains_key(*p))
                    .collect();
                let winner = match connected.as_slice() {
                    [only] if self.players.len() == self.rules.required_players() => {
                        Some((*only).clone())
                    }
                    _ => None,
                };
                self.finish(now, winner);
                return TickOutcome::Broadcast;
            }
        }

        match self.ended_at {
            Some(ended)
                if self.status == GameStatus::Finished
                    && now.saturating_duration_since(ended) > self.timings.cleanup_delay =>
            {
                TickOutcome::Expired
            }
            _ => TickOutcome::Idle,
        }
    }

    /// Owned view of the current state.
    pub fn snapshot(&self) -> GameSnapshot {
        let legal_moves = if self.status == GameStatus::InProgress {
            self.rules.legal_moves(self.turn)
        } else {
            Vec::new()
        };
        GameSnapshot {
            game_name: Some(self.name().to_owned()),
            players: self.players.clone(),
            turn: self.current_player().map(str::to_owned),
            board: self.rules.board(),
            status: self.status,
            winner: self.winner.clone(),
            disconnected: self
                .players
                .iter()
                .filter(|p| self.disconnected.contains_key(*p))
                .cloned()
                .collect(),
            legal_moves,
        }
    }

    fn seat_of(&self, player: &str) -> Option<usize> {
        self.players.iter().position(|p| p == player)
    }

    fn seat(&mut self, player: &str) {
        self.players.push(player.to_owned());
        if self.players.len() == self.rules.required_players() {
            self.status = GameStatus::InProgress;
            self.turn = 0;
            info!(game = self.name(), players = ?self.players, "game started");
        }
    }

    fn finish(&mut self, now: Instant, winner: Option<String>) {
        self.status = GameStatus::Finished;
        self.ended_at = Some(now);
        self.disconnected.clear();
        info!(game = self.name(), winner = ?winner, "game finished");
        self.winner = winner;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ConnectFour, TicTacToe};

    fn started() -> Game {
        let mut game = Game::new(Box::new(TicTacToe::new()), "alice", GameTimings::default());
        game.join("bob").unwrap();
        game
    }

    #[test]
    fn test_new_seats_creator_waiting() {
        let game = Game::new(Box::new(ConnectFour::new()), "alice", GameTimings::default());
        assert_eq!(game.players(), ["alice".to_string()]);
        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(game.current_player(), None);
    }

    #[test]
    fn test_join_second_player_starts_game() {
        let game = started();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.current_player(), Some("alice"));
    }

    #[test]
    fn test_join_third_player_full() {
        let mut game = started();
        assert_eq!(game.join("carol"), Err(GameError::Full));
    }

    #[test]
    fn test_join_twice_already_joined() {
        let mut game = Game::new(Box::new(TicTacToe::new()), "alice", GameTimings::default());
        assert_eq!(
            game.join("alice"),
            Err(GameError::AlreadyJoined("alice".into()))
        );
    }

    #[test]
    fn test_join_while_disconnected_paused() {
        let now = Instant::now();
        let mut game = started();
        game.leave("bob", false, now).unwrap();
        assert_eq!(game.join("carol"), Err(GameError::PausedForReconnect));
    }

    #[test]
    fn test_make_move_before_start_not_in_progress() {
        let mut game = Game::new(Box::new(TicTacToe::new()), "alice", GameTimings::default());
        let before = game.snapshot();
        let result = game.make_move("alice", &GameMove::cell(0, 0), Instant::now());
        assert_eq!(result, Err(GameError::NotInProgress));
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_make_move_out_of_turn_rejected_unchanged() {
        let mut game = started();
        let before = game.snapshot();
        let result = game.make_move("bob", &GameMove::cell(0, 0), Instant::now());
        assert_eq!(result, Err(GameError::NotYourTurn));
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_make_move_stranger_not_a_player() {
        let mut game = started();
        let result = game.make_move("mallory", &GameMove::cell(0, 0), Instant::now());
        assert_eq!(result, Err(GameError::NotAPlayer("mallory".into())));
    }

    #[test]
    fn test_make_move_advances_turn() {
        let mut game = started();
        game.make_move("alice", &GameMove::cell(0, 0), Instant::now()).unwrap();
        assert_eq!(game.current_player(), Some("bob"));
    }

    #[test]
    fn test_leave_unintentional_pauses_and_keeps_seat() {
        let now = Instant::now();
        let mut game = started();
        assert_eq!(game.leave("bob", false, now), Ok(Departure::Paused));
        assert_eq!(game.status(), GameStatus::Disconnected);
        assert!(game.is_player("bob"));
        assert!(game.is_disconnected("bob"));
        assert_eq!(game.snapshot().disconnected, vec!["bob".to_string()]);
    }

    #[test]
    fn test_leave_intentional_forfeits_to_remaining_player() {
        let now = Instant::now();
        let mut game = started();
        assert_eq!(game.leave("alice", true, now), Ok(Departure::Removed));
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.winner(), Some("bob"));
    }

    #[test]
    fn test_leave_last_waiting_player_emptied() {
        let mut game = Game::new(Box::new(TicTacToe::new()), "alice", GameTimings::default());
        assert_eq!(
            game.leave("alice", false, Instant::now()),
            Ok(Departure::Emptied)
        );
    }

    #[test]
    fn test_leave_stranger_not_a_player() {
        let mut game = started();
        assert!(matches!(
            game.leave("mallory", true, Instant::now()),
            Err(GameError::NotAPlayer(_))
        ));
    }

    #[test]
    fn test_rejoin_restores_in_progress() {
        let now = Instant::now();
        let mut game = started();
        game.make_move("alice", &GameMove::cell(1, 1), now).unwrap();
        let board = game.snapshot().board;

        game.leave("bob", false, now).unwrap();
        assert!(game.rejoin("bob"));

        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.current_player(), Some("bob"));
        assert_eq!(game.snapshot().board, board);
    }

    #[test]
    fn test_rejoin_unknown_player_false() {
        let mut game = started();
        assert!(!game.rejoin("bob"));
    }

    #[test]
    fn test_tick_within_grace_idle() {
        let now = Instant::now();
        let mut game = started();
        game.leave("bob", false, now).unwrap();
        assert_eq!(game.tick(now + Duration::from_secs(29)), TickOutcome::Idle);
        assert_eq!(game.status(), GameStatus::Disconnected);
    }

    #[test]
    fn test_tick_after_grace_finishes_with_remaining_winner() {
        let now = Instant::now();
        let mut game = started();
        game.leave("bob", false, now).unwrap();

        assert_eq!(game.tick(now + Duration::from_secs(31)), TickOutcome::Broadcast);
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.winner(), Some("alice"));
    }

    #[test]
    fn test_tick_both_dropped_finishes_without_winner() {
        let now = Instant::now();
        let mut game = started();
        game.leave("alice", false, now).unwrap();
        game.leave("bob", false, now).unwrap();

        assert_eq!(game.tick(now + Duration::from_secs(31)), TickOutcome::Broadcast);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_tick_finished_past_cleanup_expired() {
        let now = Instant::now();
        let mut game = started();
        game.leave("bob", true, now).unwrap();

        assert_eq!(game.tick(now + Duration::from_secs(5)), TickOutcome::Idle);
        assert_eq!(game.tick(now + Duration::from_secs(11)), TickOutcome::Expired);
    }

    #[test]
    fn test_snapshot_in_progress_lists_legal_moves() {
        let game = started();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.game_name.as_deref(), Some("tictactoe"));
        assert_eq!(snapshot.turn.as_deref(), Some("alice"));
        assert_eq!(snapshot.legal_moves.len(), 9);
    }
}
