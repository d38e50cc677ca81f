//! Fleet catalog: the three ship types and their sizes.

use core::fmt;
use core::str::FromStr;

use crate::config::SHIPS;

/// One of the fixed ship kinds a fleet must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShipType {
    Battleship,
    Submarine,
    Destroyer,
}

impl ShipType {
    /// Number of cells the ship occupies.
    pub const fn size(self) -> usize {
        match self {
            ShipType::Battleship => 3,
            ShipType::Submarine => 2,
            ShipType::Destroyer => 1,
        }
    }

    /// Display name, as the engine reports it in ship status.
    pub const fn name(self) -> &'static str {
        match self {
            ShipType::Battleship => "Battleship",
            ShipType::Submarine => "Submarine",
            ShipType::Destroyer => "Destroyer",
        }
    }

    /// Key used in the fleet setup request body.
    pub const fn key(self) -> &'static str {
        match self {
            ShipType::Battleship => "battleship",
            ShipType::Submarine => "submarine",
            ShipType::Destroyer => "destroyer",
        }
    }

    /// Index into [`SHIPS`].
    pub const fn index(self) -> usize {
        match self {
            ShipType::Battleship => 0,
            ShipType::Submarine => 1,
            ShipType::Destroyer => 2,
        }
    }

    pub fn all() -> impl Iterator<Item = ShipType> {
        SHIPS.into_iter()
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShipType {
    type Err = String;

    /// Accepts the key, the display name or its first letter, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ShipType::all()
            .find(|t| t.key() == needle || (needle.len() == 1 && t.key().starts_with(&needle)))
            .ok_or_else(|| {
                format!(
                    "unknown ship '{}' - expected battleship, submarine or destroyer",
                    s.trim()
                )
            })
    }
}
