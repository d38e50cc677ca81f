use std::time::Duration;

use crate::ship::ShipType;
use crate::sync::UpdateOrdering;

pub const GRID_SIZE: usize = 5;
pub const GRID_ROWS: [char; GRID_SIZE] = ['A', 'B', 'C', 'D', 'E'];
pub const GRID_COLS: [char; GRID_SIZE] = ['1', '2', '3', '4', '5'];

pub const NUM_SHIPS: usize = 3;
pub const SHIPS: [ShipType; NUM_SHIPS] = [
    ShipType::Battleship,
    ShipType::Submarine,
    ShipType::Destroyer,
];

/// Total number of cells a complete fleet occupies.
pub const TOTAL_SHIP_CELLS: usize = 3 + 2 + 1;

/// Interval between defense status polls once the engine tracks our fleet.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Timeout applied to every engine request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the liveness probe against a target peer.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_GAME_ID: &str = "player1";
pub const DEFAULT_ENEMY_HOST: &str = "localhost";
pub const DEFAULT_ENEMY_PORT: u16 = 8000;
pub const DEFAULT_ENEMY_GAME_ID: &str = "player1";

/// Runtime settings for one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub ws_url: String,
    pub game_id: String,
    pub poll_interval: Duration,
    pub ordering: UpdateOrdering,
}

impl ClientConfig {
    /// Build a config for the engine at `api_url`, deriving the push endpoint from it.
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            ws_url: ws_url_from(&api_url),
            api_url,
            game_id: DEFAULT_GAME_ID.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            ordering: UpdateOrdering::LastWriteWins,
        }
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = game_id.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_ordering(mut self, ordering: UpdateOrdering) -> Self {
        self.ordering = ordering;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Map an HTTP(S) engine URL onto its websocket counterpart.
pub fn ws_url_from(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", trimmed)
    }
}
