//! Fleet placement during the setup phase.
//!
//! [`FleetSetup`] keeps one [`PositionSet`] per ship type. Every mutation goes
//! through [`FleetPlacement::toggle_cell`], which refuses to grow a ship past
//! its size or onto a cell another ship holds, so a setup can never contain
//! overlapping assignments.

use rand::Rng;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::common::PlacementError;
use crate::config::{GRID_SIZE, NUM_SHIPS};
use crate::grid::{Position, PositionSet};
use crate::protocol::FleetSubmission;
use crate::ship::ShipType;

/// Positions currently assigned to each ship type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FleetSetup {
    assigned: [PositionSet; NUM_SHIPS],
}

impl FleetSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self, ship: ShipType) -> PositionSet {
        self.assigned[ship.index()]
    }

    pub fn count(&self, ship: ShipType) -> usize {
        self.assigned[ship.index()].len()
    }

    /// Union of every ship's cells.
    pub fn occupied(&self) -> PositionSet {
        self.assigned
            .iter()
            .fold(PositionSet::new(), |acc, set| acc | *set)
    }

    /// Ship type holding `position`, if any.
    pub fn owner(&self, position: Position) -> Option<ShipType> {
        ShipType::all().find(|t| self.assigned[t.index()].contains(position))
    }

    pub fn is_complete(&self, ship: ShipType) -> bool {
        self.count(ship) == ship.size()
    }

    pub fn all_placed(&self) -> bool {
        ShipType::all().all(|t| self.is_complete(t))
    }

    fn set_mut(&mut self, ship: ShipType) -> &mut PositionSet {
        &mut self.assigned[ship.index()]
    }
}

/// Serialized as `{"battleship": [...], "submarine": [...], "destroyer": [...]}`.
impl Serialize for FleetSetup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUM_SHIPS))?;
        for ship in ShipType::all() {
            map.serialize_entry(ship.key(), &self.positions(ship))?;
        }
        map.end()
    }
}

/// What a cell click did to the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The click broke a placement rule and was dropped.
    Ignored,
}

/// Interactive placement state: the fleet under construction plus the ship
/// currently being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FleetPlacement {
    setup: FleetSetup,
    active: ShipType,
    locked: bool,
}

impl Default for FleetPlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetPlacement {
    pub fn new() -> Self {
        Self {
            setup: FleetSetup::new(),
            active: ShipType::Battleship,
            locked: false,
        }
    }

    pub fn setup(&self) -> &FleetSetup {
        &self.setup
    }

    pub fn active_ship(&self) -> ShipType {
        self.active
    }

    pub fn select_ship_type(&mut self, ship: ShipType) {
        self.active = ship;
    }

    /// Whether the fleet has been committed and edits are frozen.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Reopen the fleet for editing, e.g. after a failed submission.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn toggle_cell(&mut self, position: Position) -> Toggle {
        if self.locked {
            return Toggle::Ignored;
        }
        let ship = self.active;
        if self.setup.positions(ship).contains(position) {
            self.setup.set_mut(ship).remove(position);
            return Toggle::Removed;
        }
        if self.setup.count(ship) < ship.size() && self.setup.owner(position).is_none() {
            self.setup.set_mut(ship).insert(position);
            return Toggle::Added;
        }
        Toggle::Ignored
    }

    pub fn is_ship_complete(&self, ship: ShipType) -> bool {
        self.setup.is_complete(ship)
    }

    pub fn all_ships_placed(&self) -> bool {
        self.setup.all_placed()
    }

    /// Remove every cell of the active ship.
    pub fn clear_active(&mut self) {
        if !self.locked {
            self.setup.set_mut(self.active).clear();
        }
    }

    /// Package the fleet for the engine and freeze further edits.
    pub fn commit(&mut self, game_id: &str) -> Result<FleetSubmission, PlacementError> {
        if self.locked {
            return Err(PlacementError::Locked);
        }
        if let Some(missing) = ShipType::all().find(|t| !self.setup.is_complete(*t)) {
            return Err(PlacementError::FleetIncomplete(missing));
        }
        self.locked = true;
        Ok(FleetSubmission::new(self.setup, game_id))
    }

    /// Fill every incomplete ship with a random straight run of free cells.
    ///
    /// Complete ships are left where the player put them; partial ones are
    /// cleared and re-placed. Cells are added through [`Self::toggle_cell`] so
    /// the size and overlap rules still apply.
    pub fn auto_place<R: Rng>(&mut self, rng: &mut R) -> Result<(), PlacementError> {
        if self.locked {
            return Err(PlacementError::Locked);
        }
        let previous = self.active;
        for ship in ShipType::all() {
            if self.setup.is_complete(ship) {
                continue;
            }
            self.setup.set_mut(ship).clear();
            let runs = free_runs(self.setup.occupied(), ship.size());
            if runs.is_empty() {
                self.active = previous;
                return Err(PlacementError::NoRoom(ship));
            }
            let run = &runs[rng.random_range(0..runs.len())];
            self.active = ship;
            for &p in run {
                self.toggle_cell(p);
            }
        }
        self.active = previous;
        Ok(())
    }
}

/// Every horizontal or vertical run of `len` cells that avoids `occupied`.
fn free_runs(occupied: PositionSet, len: usize) -> Vec<Vec<Position>> {
    let mut runs = Vec::new();
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            if col + len <= GRID_SIZE {
                runs.push((0..len).map(|i| (row, col + i)).collect::<Vec<_>>());
            }
            if len > 1 && row + len <= GRID_SIZE {
                runs.push((0..len).map(|i| (row + i, col)).collect::<Vec<_>>());
            }
        }
    }
    runs.into_iter()
        .filter_map(|cells| {
            cells
                .into_iter()
                .map(|(r, c)| Position::new(r, c).ok())
                .collect::<Option<Vec<_>>>()
        })
        .filter(|run| run.iter().all(|p| !occupied.contains(*p)))
        .collect()
}
