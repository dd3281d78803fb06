//! Standard chess on top of `shakmaty`.
//!
//! Board row 0 is rank 8 and column 0 is file a, so the first seat
//! (white) starts on rows 6 and 7. Pieces are encoded as
//! king 1, queen 2, rook 3, bishop 4, knight 5, pawn 6, plus 10 for white.
//!
//! Besides mate, stalemate and insufficient material, the game is drawn
//! automatically on fivefold repetition and under the 75-move rule.

use std::collections::HashMap;

use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Color, EnPassantMode, File, Move, Outcome, Position, Rank, Role, Square};

use super::{Rules, Verdict};
use crate::{Coord, GameError, GameMove};

const SIZE: usize = 8;

/// Occurrences of one position that end the game.
const REPETITION_LIMIT: u32 = 5;

/// Halfmoves without a capture or pawn move that end the game.
const HALFMOVE_LIMIT: u32 = 150;

#[derive(Debug)]
pub struct Chess {
    position: shakmaty::Chess,
    /// How often each position has occurred, keyed by Zobrist hash.
    seen: HashMap<Zobrist64, u32>,
}

impl Default for Chess {
    fn default() -> Self {
        Self::at(shakmaty::Chess::default())
    }
}

impl Chess {
    pub fn new() -> Self {
        Self::default()
    }

    fn at(position: shakmaty::Chess) -> Self {
        let mut chess = Self {
            position,
            seen: HashMap::new(),
        };
        chess.record_position();
        chess
    }

    /// Counts the current position and returns how often it has occurred.
    fn record_position(&mut self) -> u32 {
        let hash: Zobrist64 = self.position.zobrist_hash(EnPassantMode::Legal);
        let count = self.seen.entry(hash).or_insert(0);
        *count += 1;
        *count
    }

    /// Builds a game from a FEN string. Used to set up test positions.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let setup: shakmaty::fen::Fen = fen
            .parse()
            .map_err(|_| GameError::illegal("invalid position"))?;
        let position = setup
            .into_position(shakmaty::CastlingMode::Standard)
            .map_err(|_| GameError::illegal("invalid position"))?;
        Ok(Self::at(position))
    }

    fn seat_color(seat: usize) -> Color {
        if seat == 0 { Color::White } else { Color::Black }
    }

    /// Picks the legal move matching the request, if any.
    ///
    /// A promotion without an explicit piece defaults to a queen.
    fn find_move(&self, from: Square, to: Square, promotion: Option<Role>) -> Option<Move> {
        let candidates = self.position.legal_moves();
        let mut matching = candidates
            .iter()
            .filter(|m| m.from() == Some(from) && destination(m) == to);
        match promotion {
            Some(role) => matching.find(|m| m.promotion() == Some(role)).cloned(),
            None => matching
                .find(|m| matches!(m.promotion(), None | Some(Role::Queen)))
                .cloned(),
        }
    }
}

impl Rules for Chess {
    fn name(&self) -> &'static str {
        "chess"
    }

    fn apply(&mut self, seat: usize, mv: &GameMove) -> Result<Verdict, GameError> {
        let GameMove::Directed { from: Some(from), to, promotion } = mv else {
            return Err(GameError::illegal("chess moves need from and to"));
        };
        if self.position.turn() != Self::seat_color(seat) {
            return Err(GameError::NotYourTurn);
        }
        let from = square(*from).ok_or_else(|| GameError::illegal("invalid move"))?;
        let to = square(*to).ok_or_else(|| GameError::illegal("invalid move"))?;
        let promotion = match promotion.as_deref() {
            None | Some("") => None,
            Some(text) => Some(
                text.chars()
                    .next()
                    .and_then(Role::from_char)
                    .ok_or_else(|| GameError::illegal("invalid promotion"))?,
            ),
        };

        let chosen = self
            .find_move(from, to, promotion)
            .ok_or_else(|| GameError::illegal("invalid move"))?;
        self.position.play_unchecked(&chosen);
        let occurrences = self.record_position();

        Ok(match self.position.outcome() {
            Some(Outcome::Decisive { .. }) => Verdict::Win,
            Some(Outcome::Draw) => Verdict::Draw,
            None if occurrences >= REPETITION_LIMIT => Verdict::Draw,
            None if self.position.halfmoves() >= HALFMOVE_LIMIT => Verdict::Draw,
            None => Verdict::Continue,
        })
    }

    fn board(&self) -> Vec<Vec<u8>> {
        let board = self.position.board();
        (0..SIZE)
            .map(|row| {
                (0..SIZE)
                    .map(|col| {
                        square(Coord::new(row, col))
                            .and_then(|sq| board.piece_at(sq))
                            .map_or(0, |piece| piece_code(piece.role, piece.color))
                    })
                    .collect()
            })
            .collect()
    }

    fn legal_moves(&self, seat: usize) -> Vec<GameMove> {
        if self.position.turn() != Self::seat_color(seat) {
            return Vec::new();
        }
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| {
                Some(GameMove::Directed {
                    from: Some(coord(m.from()?)),
                    to: coord(destination(m)),
                    promotion: m.promotion().map(|role| role.char().to_string()),
                })
            })
            .collect()
    }
}

/// Square the moving king or piece ends up on.
///
/// `shakmaty` reports castling as king-takes-rook; clients expect the
/// king's landing square on the g or c file instead.
fn destination(m: &Move) -> Square {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    }
}

fn square(coord: Coord) -> Option<Square> {
    if coord.row >= SIZE || coord.col >= SIZE {
        return None;
    }
    Some(Square::from_coords(
        File::new(coord.col as u32),
        Rank::new((SIZE - 1 - coord.row) as u32),
    ))
}

fn coord(sq: Square) -> Coord {
    Coord::new(SIZE - 1 - usize::from(sq.rank()), usize::from(sq.file()))
}

fn piece_code(role: Role, color: Color) -> u8 {
    let base = match role {
        Role::King => 1,
        Role::Queen => 2,
        Role::Rook => 3,
        Role::Bishop => 4,
        Role::Knight => 5,
        Role::Pawn => 6,
    };
    if color == Color::White { base + 10 } else { base }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: (usize, usize), to: (usize, usize)) -> GameMove {
        GameMove::directed(Coord::new(from.0, from.1), Coord::new(to.0, to.1))
    }

    #[test]
    fn test_board_initial_position_encoding() {
        let chess = Chess::new();
        let board = chess.board();
        assert_eq!(board[0], vec![3, 5, 4, 2, 1, 4, 5, 3]);
        assert_eq!(board[1], vec![6; 8]);
        assert_eq!(board[6], vec![16; 8]);
        assert_eq!(board[7], vec![13, 15, 14, 12, 11, 14, 15, 13]);
        assert!(board[2..6].iter().flatten().all(|&c| c == 0));
    }

    #[test]
    fn test_apply_pawn_double_step_moves_piece() {
        let mut chess = Chess::new();
        // e2e4
        let verdict = chess.apply(0, &mv((6, 4), (4, 4))).unwrap();
        assert_eq!(verdict, Verdict::Continue);
        let board = chess.board();
        assert_eq!(board[6][4], 0);
        assert_eq!(board[4][4], 16);
    }

    #[test]
    fn test_apply_illegal_knight_jump_rejected() {
        let mut chess = Chess::new();
        let before = chess.board();
        // g1g3 is not a knight move.
        let err = chess.apply(0, &mv((7, 6), (5, 6))).unwrap_err();
        assert_eq!(err, GameError::IllegalMove("invalid move".into()));
        assert_eq!(chess.board(), before);
    }

    #[test]
    fn test_apply_cell_shape_rejected() {
        let mut chess = Chess::new();
        assert!(chess.apply(0, &GameMove::cell(4, 4)).is_err());
    }

    #[test]
    fn test_apply_fools_mate_wins() {
        let mut chess = Chess::new();
        chess.apply(0, &mv((6, 5), (5, 5))).unwrap(); // f3
        chess.apply(1, &mv((1, 4), (3, 4))).unwrap(); // e5
        chess.apply(0, &mv((6, 6), (4, 6))).unwrap(); // g4
        let verdict = chess.apply(1, &mv((0, 3), (4, 7))).unwrap(); // Qh4#
        assert_eq!(verdict, Verdict::Win);
    }

    #[test]
    fn test_apply_promotion_to_knight() {
        let mut chess = Chess::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let promote = GameMove::Directed {
            from: Some(Coord::new(1, 0)),
            to: Coord::new(0, 0),
            promotion: Some("n".into()),
        };
        chess.apply(0, &promote).unwrap();
        assert_eq!(chess.board()[0][0], 15);
    }

    #[test]
    fn test_apply_promotion_defaults_to_queen() {
        let mut chess = Chess::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        chess.apply(0, &mv((1, 0), (0, 0))).unwrap();
        assert_eq!(chess.board()[0][0], 12);
    }

    #[test]
    fn test_apply_castle_uses_king_destination() {
        let mut chess =
            Chess::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        chess.apply(0, &mv((7, 4), (7, 6))).unwrap();
        let board = chess.board();
        assert_eq!(board[7][6], 11);
        assert_eq!(board[7][5], 13);
    }

    #[test]
    fn test_apply_stalemate_draws() {
        let mut chess = Chess::from_fen("k7/8/2K5/8/8/8/8/1Q6 w - - 0 1").unwrap();
        let verdict = chess.apply(0, &mv((7, 1), (2, 1))).unwrap(); // Qb6
        assert_eq!(verdict, Verdict::Draw);
    }

    #[test]
    fn test_apply_fivefold_repetition_draws() {
        let mut chess = Chess::new();
        let shuffle = [
            (0, mv((7, 6), (5, 5))), // Nf3
            (1, mv((0, 6), (2, 5))), // Nf6
            (0, mv((5, 5), (7, 6))), // Ng1
            (1, mv((2, 5), (0, 6))), // Ng8
        ];
        // The start position occurs for the fifth time on the last move.
        for round in 0..4 {
            for (i, (seat, step)) in shuffle.iter().enumerate() {
                let verdict = chess.apply(*seat, step).unwrap();
                let last = round == 3 && i == shuffle.len() - 1;
                let expected = if last { Verdict::Draw } else { Verdict::Continue };
                assert_eq!(verdict, expected, "round {round}, move {i}");
            }
        }
    }

    #[test]
    fn test_apply_seventy_five_move_rule_draws() {
        let mut chess = Chess::from_fen("k7/8/8/8/8/8/8/KR6 w - - 148 100").unwrap();
        assert_eq!(chess.apply(0, &mv((7, 1), (6, 1))).unwrap(), Verdict::Continue); // Rb2
        assert_eq!(chess.apply(1, &mv((0, 0), (1, 0))).unwrap(), Verdict::Draw); // Ka7
    }

    #[test]
    fn test_apply_capture_to_bare_kings_draws() {
        let mut chess = Chess::from_fen("k7/8/8/8/8/8/1n6/K7 w - - 0 1").unwrap();
        let verdict = chess.apply(0, &mv((7, 0), (6, 1))).unwrap(); // Kxb2
        assert_eq!(verdict, Verdict::Draw);
    }

    #[test]
    fn test_legal_moves_initial_position_has_twenty() {
        let chess = Chess::new();
        assert_eq!(chess.legal_moves(0).len(), 20);
        assert!(chess.legal_moves(1).is_empty());
    }
}
