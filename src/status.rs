//! Status payloads reported by the remote engine.
//!
//! These are read-only snapshots: each update replaces the cached copy whole.
//! Cell marks arrive as loose string tokens and are decoded into the closed
//! [`CellMark`] set here, at the boundary; anything unrecognised reads as
//! [`CellMark::Empty`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::GRID_SIZE;
use crate::grid::Position;

/// Engine-reported state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellMark {
    #[default]
    Empty,
    Miss,
    Hit,
    Sunk,
}

impl CellMark {
    /// Decode an engine token. Both the engine's glyphs (`~ O X #`) and the
    /// spelled-out names are understood.
    pub fn decode(token: &str) -> Self {
        match token.trim() {
            "O" | "o" | "miss" => CellMark::Miss,
            "X" | "x" | "hit" => CellMark::Hit,
            "#" | "sunk" => CellMark::Sunk,
            _ => CellMark::Empty,
        }
    }

    /// Token the engine uses for this mark.
    pub fn token(self) -> &'static str {
        match self {
            CellMark::Empty => "~",
            CellMark::Miss => "O",
            CellMark::Hit => "X",
            CellMark::Sunk => "#",
        }
    }
}

/// Mark for every cell of the 5×5 grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "HashMap<String, serde_json::Value>", into = "BTreeMap<String, String>")]
pub struct Grid {
    marks: [CellMark; GRID_SIZE * GRID_SIZE],
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, position: Position) -> CellMark {
        self.marks[position.index()]
    }

    pub fn set(&mut self, position: Position, mark: CellMark) {
        self.marks[position.index()] = mark;
    }
}

impl FromIterator<(Position, CellMark)> for Grid {
    fn from_iter<I: IntoIterator<Item = (Position, CellMark)>>(iter: I) -> Self {
        let mut grid = Grid::new();
        for (p, m) in iter {
            grid.set(p, m);
        }
        grid
    }
}

impl From<HashMap<String, serde_json::Value>> for Grid {
    fn from(raw: HashMap<String, serde_json::Value>) -> Self {
        let mut grid = Grid::new();
        for (key, value) in raw {
            match key.parse::<Position>() {
                Ok(p) => grid.set(p, value.as_str().map(CellMark::decode).unwrap_or_default()),
                Err(_) => log::debug!("Ignoring grid entry for unknown cell '{}'", key),
            }
        }
        grid
    }
}

impl From<Grid> for BTreeMap<String, String> {
    fn from(grid: Grid) -> Self {
        Position::all()
            .map(|p| (p.to_string(), grid.mark(p).token().to_string()))
            .collect()
    }
}

/// Damage report for one of our ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipStatus {
    pub name: String,
    pub is_sunk: bool,
    pub hit_count: u32,
    pub total_positions: u32,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub hits: Vec<Position>,
}

/// Our fleet as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseStatus {
    pub state: String,
    pub total_attacks: u32,
    #[serde(default)]
    pub ships_status: Vec<ShipStatus>,
    #[serde(default)]
    pub grid: Grid,
}

impl DefenseStatus {
    /// Human-readable name for the engine's defense state tag.
    pub fn state_label(&self) -> &str {
        match self.state.as_str() {
            "q0" => "Initial",
            "q1" => "Fleet intact",
            "q2" => "Hit",
            "q3" => "Ship sunk",
            "q4" => "Defeat",
            other => other,
        }
    }

    pub fn ships_afloat(&self) -> usize {
        self.ships_status.iter().filter(|s| !s.is_sunk).count()
    }
}

/// Our attack record against the target peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackStatus {
    pub total_attacks: u32,
    pub hits: u32,
    pub misses: u32,
    pub sunk_ships: u32,
    pub accuracy: f64,
    pub game_won: bool,
    #[serde(default)]
    pub grid: Grid,
}

impl AttackStatus {
    /// Status of a freshly initialised attack game.
    pub fn fresh() -> Self {
        Self {
            total_attacks: 0,
            hits: 0,
            misses: 0,
            sunk_ships: 0,
            accuracy: 0.0,
            game_won: false,
            grid: Grid::new(),
        }
    }
}
