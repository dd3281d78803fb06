//! Move payloads sent by players.

use serde::{Deserialize, Serialize};

/// A board coordinate. Row 0 is the top row as rendered by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A move as it arrives on the wire.
///
/// The shape is decided by the JSON itself: objects with a `to` field
/// are directed moves (chess, or grid games addressed by target cell),
/// objects with a `col` field are cell moves. Connect four only reads
/// the column, so `row` may be omitted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameMove {
    Directed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<Coord>,
        to: Coord,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<String>,
    },
    Cell {
        #[serde(default)]
        row: usize,
        col: usize,
    },
}

impl GameMove {
    /// Shorthand for a grid-game cell.
    pub fn cell(row: usize, col: usize) -> Self {
        Self::Cell { row, col }
    }

    /// Shorthand for a chess move without promotion.
    pub fn directed(from: Coord, to: Coord) -> Self {
        Self::Directed {
            from: Some(from),
            to,
            promotion: None,
        }
    }

    /// The destination cell, whichever shape the move was sent in.
    pub fn target(&self) -> Coord {
        match self {
            Self::Directed { to, .. } => *to,
            Self::Cell { row, col } => Coord::new(*row, *col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_row_col_is_cell() {
        let mv: GameMove = serde_json::from_str(r#"{"row":1,"col":2}"#).unwrap();
        assert_eq!(mv, GameMove::cell(1, 2));
    }

    #[test]
    fn test_deserialize_col_only_defaults_row() {
        let mv: GameMove = serde_json::from_str(r#"{"col":4}"#).unwrap();
        assert_eq!(mv, GameMove::cell(0, 4));
    }

    #[test]
    fn test_deserialize_from_to_promotion_is_directed() {
        let json = r#"{"from":{"row":1,"col":0},"to":{"row":0,"col":0},"promotion":"q"}"#;
        let mv: GameMove = serde_json::from_str(json).unwrap();
        assert_eq!(
            mv,
            GameMove::Directed {
                from: Some(Coord::new(1, 0)),
                to: Coord::new(0, 0),
                promotion: Some("q".into()),
            }
        );
    }

    #[test]
    fn test_target_directed_returns_to() {
        let mv = GameMove::directed(Coord::new(6, 4), Coord::new(4, 4));
        assert_eq!(mv.target(), Coord::new(4, 4));
    }

    #[test]
    fn test_deserialize_negative_row_fails() {
        assert!(serde_json::from_str::<GameMove>(r#"{"row":-1,"col":0}"#).is_err());
    }
}
