use super::{Rules, Verdict, seat_mark};
use crate::{GameError, GameMove};

const SIZE: usize = 3;

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Three in a row on a 3×3 grid.
#[derive(Debug, Default)]
pub struct TicTacToe {
    board: [[u8; SIZE]; SIZE],
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    fn has_line(&self) -> bool {
        LINES.iter().any(|line| {
            let [a, b, c] = line.map(|(r, c)| self.board[r][c]);
            a != 0 && a == b && a == c
        })
    }

    fn is_full(&self) -> bool {
        self.board.iter().flatten().all(|&cell| cell != 0)
    }
}

impl Rules for TicTacToe {
    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn apply(&mut self, seat: usize, mv: &GameMove) -> Result<Verdict, GameError> {
        let to = mv.target();
        if to.row >= SIZE || to.col >= SIZE {
            return Err(GameError::illegal("invalid move"));
        }
        if self.board[to.row][to.col] != 0 {
            return Err(GameError::illegal("cell already taken"));
        }
        self.board[to.row][to.col] = seat_mark(seat);

        Ok(if self.has_line() {
            Verdict::Win
        } else if self.is_full() {
            Verdict::Draw
        } else {
            Verdict::Continue
        })
    }

    fn board(&self) -> Vec<Vec<u8>> {
        self.board.iter().map(|row| row.to_vec()).collect()
    }

    fn legal_moves(&self, _seat: usize) -> Vec<GameMove> {
        let mut moves = Vec::new();
        for (row, cells) in self.board.iter().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                if cell == 0 {
                    moves.push(GameMove::cell(row, col));
                }
            }
        }
        moves
    }
}
