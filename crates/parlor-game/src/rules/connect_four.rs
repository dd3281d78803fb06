use super::{Rules, Verdict, seat_mark};
use crate::{GameError, GameMove};

const ROWS: usize = 6;
const COLS: usize = 7;
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Four in a row on a 6×7 grid with gravity. Row 0 is the top.
#[derive(Debug, Default)]
pub struct ConnectFour {
    board: [[u8; COLS]; ROWS],
}

impl ConnectFour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest empty row in `col`, or `None` when the column is full.
    fn landing_row(&self, col: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.board[row][col] == 0)
    }

    fn run_length(&self, row: usize, col: usize, (dr, dc): (isize, isize)) -> usize {
        let mark = self.board[row][col];
        let mut count = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && self.board[r as usize][c as usize] == mark
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    fn connects_four(&self, row: usize, col: usize) -> bool {
        DIRECTIONS.iter().any(|&(dr, dc)| {
            1 + self.run_length(row, col, (dr, dc)) + self.run_length(row, col, (-dr, -dc)) >= 4
        })
    }
}

impl Rules for ConnectFour {
    fn name(&self) -> &'static str {
        "connect4"
    }

    fn apply(&mut self, seat: usize, mv: &GameMove) -> Result<Verdict, GameError> {
        let col = mv.target().col;
        if col >= COLS {
            return Err(GameError::illegal("invalid move"));
        }
        let row = self
            .landing_row(col)
            .ok_or_else(|| GameError::illegal("invalid move"))?;
        self.board[row][col] = seat_mark(seat);

        Ok(if self.connects_four(row, col) {
            Verdict::Win
        } else if self.board[0].iter().all(|&cell| cell != 0) {
            Verdict::Draw
        } else {
            Verdict::Continue
        })
    }

    fn board(&self) -> Vec<Vec<u8>> {
        self.board.iter().map(|row| row.to_vec()).collect()
    }

    fn legal_moves(&self, _seat: usize) -> Vec<GameMove> {
        (0..COLS)
            .filter_map(|col| self.landing_row(col).map(|row| GameMove::cell(row, col)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop(rules: &mut ConnectFour, seat: usize, col: usize) -> Result<Verdict, GameError> {
        rules.apply(seat, &GameMove::Cell { row: 0, col })
    }

    #[test]
    fn test_apply_piece_lands_on_bottom_row() {
        let mut rules = ConnectFour::new();
        drop(&mut rules, 0, 3).unwrap();
        assert_eq!(rules.board()[5][3], 1);
        assert_eq!(rules.board()[4][3], 0);
    }

    #[test]
    fn test_apply_full_column_rejected_board_unchanged() {
        let mut rules = ConnectFour::new();
        for i in 0..ROWS {
            drop(&mut rules, i % 2, 0).unwrap();
        }
        let before = rules.board();

        let err = drop(&mut rules, 0, 0).unwrap_err();
        assert_eq!(err, GameError::IllegalMove("invalid move".into()));
        assert_eq!(rules.board(), before);
    }

    #[test]
    fn test_apply_horizontal_four_wins() {
        let mut rules = ConnectFour::new();
        for col in 0..3 {
            assert_eq!(drop(&mut rules, 0, col).unwrap(), Verdict::Continue);
            assert_eq!(drop(&mut rules, 1, col).unwrap(), Verdict::Continue);
        }
        assert_eq!(drop(&mut rules, 0, 3).unwrap(), Verdict::Win);
    }

    #[test]
    fn test_apply_diagonal_four_wins() {
        let mut rules = ConnectFour::new();
        // Staircase for seat 0 rising to the right, seat 1 fills underneath.
        drop(&mut rules, 0, 0).unwrap();
        drop(&mut rules, 1, 1).unwrap();
        drop(&mut rules, 0, 1).unwrap();
        drop(&mut rules, 1, 2).unwrap();
        drop(&mut rules, 0, 3).unwrap();
        drop(&mut rules, 1, 2).unwrap();
        drop(&mut rules, 0, 2).unwrap();
        drop(&mut rules, 1, 3).unwrap();
        drop(&mut rules, 0, 5).unwrap();
        drop(&mut rules, 1, 3).unwrap();
        assert_eq!(drop(&mut rules, 0, 3).unwrap(), Verdict::Win);
    }

    #[test]
    fn test_apply_column_out_of_range_rejected() {
        let mut rules = ConnectFour::new();
        assert!(drop(&mut rules, 0, COLS).is_err());
    }

    #[test]
    fn test_legal_moves_skips_full_columns() {
        let mut rules = ConnectFour::new();
        for i in 0..ROWS {
            drop(&mut rules, i % 2, 6).unwrap();
        }
        let moves = rules.legal_moves(0);
        assert_eq!(moves.len(), COLS - 1);
        assert_eq!(moves[0], GameMove::cell(5, 0));
    }
}
