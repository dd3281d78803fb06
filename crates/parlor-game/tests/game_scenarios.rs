//! End-to-end game scenarios driven through the public engine API.

use std::time::{Duration, Instant};

use parlor_game::{
    Coord, GameError, GameMove, GameRegistry, GameStatus, GameTimings, TickOutcome,
};

fn start(kind: &str) -> parlor_game::Game {
    let mut game = GameRegistry::standard()
        .create(kind, "alice", GameTimings::default())
        .expect("registered kind");
    game.join("bob").expect("second seat free");
    game
}

#[test]
fn test_tictactoe_top_row_alice_wins() {
    let now = Instant::now();
    let mut game = start("tictactoe");

    for (player, row, col) in [
        ("alice", 0, 0),
        ("bob", 1, 1),
        ("alice", 0, 1),
        ("bob", 1, 0),
        ("alice", 0, 2),
    ] {
        game.make_move(player, &GameMove::cell(row, col), now)
            .expect("legal move");
    }

    let snapshot = game.snapshot();
    assert_eq!(snapshot.status, GameStatus::Finished);
    assert_eq!(snapshot.winner.as_deref(), Some("alice"));
    assert_eq!(snapshot.board[0], vec![1, 1, 1]);
    assert!(snapshot.legal_moves.is_empty());
}

#[test]
fn test_tictactoe_move_after_finish_not_in_progress() {
    let now = Instant::now();
    let mut game = start("tictactoe");
    for (player, row, col) in [
        ("alice", 0, 0),
        ("bob", 1, 1),
        ("alice", 0, 1),
        ("bob", 1, 0),
        ("alice", 0, 2),
    ] {
        game.make_move(player, &GameMove::cell(row, col), now).unwrap();
    }

    let result = game.make_move("bob", &GameMove::cell(2, 2), now);
    assert_eq!(result, Err(GameError::NotInProgress));
    assert_eq!(game.winner(), Some("alice"));
}

#[test]
fn test_connect4_full_column_invalid_move_board_unchanged() {
    let now = Instant::now();
    let mut game = start("connect4");
    for i in 0..6 {
        let player = if i % 2 == 0 { "alice" } else { "bob" };
        game.make_move(player, &GameMove::cell(0, 2), now).unwrap();
    }
    let before = game.snapshot();

    let result = game.make_move("alice", &GameMove::cell(0, 2), now);

    assert_eq!(result, Err(GameError::IllegalMove("invalid move".into())));
    let after = game.snapshot();
    assert_eq!(after.board, before.board);
    assert_eq!(after.turn, before.turn);
}

#[test]
fn test_connect4_vertical_four_wins() {
    let now = Instant::now();
    let mut game = start("connect4");
    for _ in 0..3 {
        game.make_move("alice", &GameMove::cell(0, 0), now).unwrap();
        game.make_move("bob", &GameMove::cell(0, 1), now).unwrap();
    }
    game.make_move("alice", &GameMove::cell(0, 0), now).unwrap();

    assert_eq!(game.status(), GameStatus::Finished);
    assert_eq!(game.winner(), Some("alice"));
}

#[test]
fn test_reconnection_timeout_awards_remaining_player() {
    let start_at = Instant::now();
    let mut game = start("tictactoe");

    game.leave("bob", false, start_at).unwrap();
    assert_eq!(game.status(), GameStatus::Disconnected);

    let mut outcome = TickOutcome::Idle;
    for second in 1..=31 {
        outcome = game.tick(start_at + Duration::from_secs(second));
        if outcome != TickOutcome::Idle {
            break;
        }
    }

    assert_eq!(outcome, TickOutcome::Broadcast);
    assert_eq!(game.status(), GameStatus::Finished);
    assert_eq!(game.winner(), Some("alice"));
}

#[test]
fn test_reconnection_within_grace_resumes_board_and_turn() {
    let now = Instant::now();
    let mut game = start("connect4");
    game.make_move("alice", &GameMove::cell(0, 3), now).unwrap();
    let before = game.snapshot();

    game.leave("bob", false, now).unwrap();
    assert_eq!(
        game.make_move("bob", &GameMove::cell(0, 3), now),
        Err(GameError::NotInProgress)
    );
    assert_eq!(game.tick(now + Duration::from_secs(20)), TickOutcome::Idle);
    assert!(game.rejoin("bob"));

    let after = game.snapshot();
    assert_eq!(after.status, GameStatus::InProgress);
    assert_eq!(after.board, before.board);
    assert_eq!(after.turn.as_deref(), Some("bob"));
}

#[test]
fn test_finished_game_expires_after_cleanup_delay() {
    let now = Instant::now();
    let mut game = start("tictactoe");
    game.leave("alice", true, now).unwrap();

    assert_eq!(game.tick(now + Duration::from_secs(10)), TickOutcome::Idle);
    assert_eq!(game.tick(now + Duration::from_secs(11)), TickOutcome::Expired);
}

#[test]
fn test_chess_fools_mate_black_wins() {
    let now = Instant::now();
    let mut game = start("chess");
    let m = |from: (usize, usize), to: (usize, usize)| {
        GameMove::directed(Coord::new(from.0, from.1), Coord::new(to.0, to.1))
    };

    game.make_move("alice", &m((6, 5), (5, 5)), now).unwrap();
    game.make_move("bob", &m((1, 4), (3, 4)), now).unwrap();
    game.make_move("alice", &m((6, 6), (4, 6)), now).unwrap();
    game.make_move("bob", &m((0, 3), (4, 7)), now).unwrap();

    assert_eq!(game.status(), GameStatus::Finished);
    assert_eq!(game.winner(), Some("bob"));
}

#[test]
fn test_chess_wrong_colour_piece_rejected() {
    let now = Instant::now();
    let mut game = start("chess");
    let black_pawn = GameMove::directed(Coord::new(1, 4), Coord::new(3, 4));

    let result = game.make_move("alice", &black_pawn, now);

    assert_eq!(result, Err(GameError::IllegalMove("invalid move".into())));
    assert_eq!(game.current_player(), Some("alice"));
}
