//! Per-cell presentation, derived from the fleet under construction or the
//! engine's grid. Everything here is a pure function of its inputs.

use crate::fleet::FleetSetup;
use crate::grid::Position;
use crate::mode::GameMode;
use crate::ship::ShipType;
use crate::status::{CellMark, Grid};

/// Whether the board shows local placement or remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Defense mode before the engine has reported any status.
    Setup,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Held by the ship currently being placed.
    SelectedCurrent,
    /// Held by another ship.
    OccupiedOther,
    /// Free during setup.
    Selectable,
    /// Engine-reported state.
    Mark(CellMark),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPresentation {
    pub kind: CellKind,
    /// Overlay for the pending attack target.
    pub targeted: bool,
}

impl CellPresentation {
    /// Stable semantic token for the cell.
    pub fn token(&self) -> &'static str {
        match self.kind {
            CellKind::SelectedCurrent => "selected-current",
            CellKind::OccupiedOther => "occupied-other",
            CellKind::Selectable => "empty-selectable",
            CellKind::Mark(CellMark::Empty) => "empty",
            CellKind::Mark(CellMark::Miss) => "miss",
            CellKind::Mark(CellMark::Hit) => "hit",
            CellKind::Mark(CellMark::Sunk) => "sunk",
        }
    }

    /// Single-character rendering used by the terminal grid.
    pub fn glyph(&self) -> char {
        match self.kind {
            CellKind::SelectedCurrent => '*',
            CellKind::OccupiedOther => '+',
            CellKind::Selectable => '.',
            CellKind::Mark(CellMark::Empty) => '~',
            CellKind::Mark(CellMark::Miss) => 'O',
            CellKind::Mark(CellMark::Hit) => 'X',
            CellKind::Mark(CellMark::Sunk) => '#',
        }
    }
}

/// Everything a cell's presentation depends on.
#[derive(Debug, Clone, Copy)]
pub struct CellInputs<'a> {
    pub mode: GameMode,
    pub phase: Phase,
    pub fleet: &'a FleetSetup,
    pub active: ShipType,
    pub remote: Option<&'a Grid>,
    pub selected: Option<Position>,
}

/// Presentation of `position`, highest precedence first: the active ship's
/// cells, other ships' cells and free cells during setup; otherwise the
/// engine's mark (empty when absent), with a target overlay in Attack mode.
pub fn derive(position: Position, inputs: &CellInputs<'_>) -> CellPresentation {
    if inputs.phase == Phase::Setup {
        let kind = if inputs.fleet.positions(inputs.active).contains(position) {
            CellKind::SelectedCurrent
        } else if inputs.fleet.occupied().contains(position) {
            CellKind::OccupiedOther
        } else {
            CellKind::Selectable
        };
        return CellPresentation {
            kind,
            targeted: false,
        };
    }
    let mark = inputs
        .remote
        .map(|grid| grid.mark(position))
        .unwrap_or_default();
    CellPresentation {
        kind: CellKind::Mark(mark),
        targeted: inputs.mode == GameMode::Attack && inputs.selected == Some(position),
    }
}

/// Presentation of every cell in canonical order.
pub fn derive_all(inputs: &CellInputs<'_>) -> Vec<(Position, CellPresentation)> {
    Position::all().map(|p| (p, derive(p, inputs))).collect()
}
