use std::collections::HashMap;

use crate::rules::{Chess, ConnectFour, Rules, TicTacToe};
use crate::{Game, GameError, GameTimings};

/// Builds a fresh board for one game kind.
pub type RulesFactory = fn() -> Box<dyn Rules>;

/// Maps wire names (`"tictactoe"`, `"connect4"`, `"chess"`) to rule sets.
#[derive(Debug, Clone)]
pub struct GameRegistry {
    factories: HashMap<&'static str, RulesFactory>,
}

impl GameRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with every built-in kind.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("tictactoe", || Box::new(TicTacToe::new()));
        registry.register("connect4", || Box::new(ConnectFour::new()));
        registry.register("chess", || Box::new(Chess::new()));
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: RulesFactory) {
        self.factories.insert(name, factory);
    }

    /// Starts a game of kind `name` with `creator` seated.
    pub fn create(
        &self,
        name: &str,
        creator: &str,
        timings: GameTimings,
    ) -> Result<Game, GameError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| GameError::UnsupportedGame(name.to_owned()))?;
        Ok(Game::new(factory(), creator, timings))
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registers_three_kinds() {
        let registry = GameRegistry::standard();
        assert_eq!(registry.names(), vec!["chess", "connect4", "tictactoe"]);
    }

    #[test]
    fn test_create_known_name_seats_creator() {
        let registry = GameRegistry::standard();
        let game = registry
            .create("connect4", "alice", GameTimings::default())
            .unwrap();
        assert_eq!(game.name(), "connect4");
        assert_eq!(game.players(), ["alice".to_string()]);
    }

    #[test]
    fn test_create_unknown_name_unsupported() {
        let registry = GameRegistry::standard();
        let err = registry
            .create("minesweeper", "alice", GameTimings::default())
            .unwrap_err();
        assert_eq!(err, GameError::UnsupportedGame("minesweeper".into()));
    }
}
