use core::fmt;

/// Which sub-view of the client is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    Menu,
    Defense,
    Attack,
}

impl GameMode {
    /// Whether navigation from `self` to `next` is allowed. Defense and
    /// Attack are only reachable from the menu, and only lead back to it.
    pub fn can_enter(self, next: GameMode) -> bool {
        matches!(
            (self, next),
            (GameMode::Menu, GameMode::Defense)
                | (GameMode::Menu, GameMode::Attack)
                | (GameMode::Defense, GameMode::Menu)
                | (GameMode::Attack, GameMode::Menu)
        )
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Menu => f.write_str("Menu"),
            GameMode::Defense => f.write_str("Defense"),
            GameMode::Attack => f.write_str("Attack"),
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered(GameMode),
    /// Not a legal edge from the current mode; nothing happened.
    Ignored,
}
