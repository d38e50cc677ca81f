//! The fixed 5×5 grid: position identifiers and a packed set of positions.
//!
//! A [`PositionSet`] stores the grid as 25 bits of a `u32`, row-major, so
//! fleet assignments and occupancy checks are plain bitwise operations.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{GRID_COLS, GRID_ROWS, GRID_SIZE};

/// Errors raised when a textual or numeric coordinate does not name a grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Row or column index is outside `0..GRID_SIZE`.
    OutOfBounds { row: usize, col: usize },
    /// Text that is not a row letter followed by a column digit.
    Malformed(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds { row, col } => {
                write!(f, "position out of bounds: row={}, col={}", row, col)
            }
            GridError::Malformed(text) => write!(
                f,
                "invalid position '{}' - expected a row A-E followed by a column 1-5",
                text
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// One cell of the grid, e.g. `A3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Result<Self, GridError> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return Err(GridError::OutOfBounds { row, col });
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    /// Build a position from its row letter and column digit.
    pub fn from_labels(row: char, col: char) -> Result<Self, GridError> {
        let r = GRID_ROWS
            .iter()
            .position(|&l| l == row.to_ascii_uppercase());
        let c = GRID_COLS.iter().position(|&l| l == col);
        match (r, c) {
            (Some(r), Some(c)) => Self::new(r, c),
            _ => Err(GridError::Malformed(format!("{}{}", row, col))),
        }
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }

    pub fn row_label(&self) -> char {
        GRID_ROWS[self.row()]
    }

    pub fn col_label(&self) -> char {
        GRID_COLS[self.col()]
    }

    /// Row-major bit index of this cell.
    pub fn index(&self) -> usize {
        self.row() * GRID_SIZE + self.col()
    }

    fn from_index(idx: usize) -> Self {
        Self {
            row: (idx / GRID_SIZE) as u8,
            col: (idx % GRID_SIZE) as u8,
        }
    }

    /// Canonical enumeration of all 25 positions: A1, A2, ..., E5.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..GRID_SIZE * GRID_SIZE).map(Position::from_index)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), self.col_label())
    }
}

impl FromStr for Position {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(row), Some(col), None) => Self::from_labels(row, col)
                .map_err(|_| GridError::Malformed(trimmed.to_string())),
            _ => Err(GridError::Malformed(trimmed.to_string())),
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Every label combination in row-major order, as the grid is rendered.
pub fn enumerate_labels(rows: &[char], cols: &[char]) -> Vec<String> {
    rows.iter()
        .flat_map(|r| cols.iter().map(move |c| format!("{}{}", r, c)))
        .collect()
}

/// A set of grid positions packed into the low 25 bits of a `u32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PositionSet {
    bits: u32,
}

impl PositionSet {
    const MASK: u32 = (1 << (GRID_SIZE * GRID_SIZE)) - 1;

    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Set containing all 25 cells.
    pub const fn full() -> Self {
        Self { bits: Self::MASK }
    }

    pub fn contains(&self, position: Position) -> bool {
        (self.bits >> position.index()) & 1 == 1
    }

    /// Adds `position`; returns `false` if it was already present.
    pub fn insert(&mut self, position: Position) -> bool {
        let had = self.contains(position);
        self.bits |= 1 << position.index();
        !had
    }

    /// Removes `position`; returns `false` if it was absent.
    pub fn remove(&mut self, position: Position) -> bool {
        let had = self.contains(position);
        self.bits &= !(1 << position.index());
        had
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_disjoint(&self, other: &PositionSet) -> bool {
        self.bits & other.bits == 0
    }

    /// Positions in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(move |p| self.contains(*p))
    }

    /// Rebuild a set from raw bits, dropping anything outside the grid.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            bits: raw & Self::MASK,
        }
    }
}

impl FromIterator<Position> for PositionSet {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut set = PositionSet::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl BitOr for PositionSet {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self::from_raw(self.bits | rhs.bits)
    }
}

impl BitOrAssign for PositionSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl BitAnd for PositionSet {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self::from_raw(self.bits & rhs.bits)
    }
}

/// Complement within the 25 grid cells.
impl Not for PositionSet {
    type Output = Self;
    fn not(self) -> Self {
        Self::from_raw(!self.bits)
    }
}

impl fmt::Debug for PositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|p| p.to_string())).finish()
    }
}

impl Serialize for PositionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
