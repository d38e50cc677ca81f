//! Terminal rendering of the session.

use std::fmt::Write;

use crate::config::{GRID_COLS, GRID_SIZE};
use crate::mode::GameMode;
use crate::presentation::Phase;
use crate::session::Session;
use crate::ship::ShipType;
use crate::status::{AttackStatus, DefenseStatus};

pub const LEGEND: &str =
    "~ water  O miss  X hit  # sunk  * current ship  + other ship  . free  [ ] target";

/// The 5×5 grid for the current mode, with row and column labels.
pub fn render_grid(session: &Session) -> String {
    let mut out = String::new();
    out.push_str("   ");
    for c in GRID_COLS {
        let _ = write!(out, "  {} ", c);
    }
    out.push('\n');
    for row in session.cells().chunks(GRID_SIZE) {
        if let Some((first, _)) = row.first() {
            let _ = write!(out, " {} ", first.row_label());
        }
        for (_, cell) in row {
            if cell.targeted {
                let _ = write!(out, " [{}]", cell.glyph());
            } else {
                let _ = write!(out, "  {} ", cell.glyph());
            }
        }
        out.push('\n');
    }
    out
}

/// Per-ship placement progress during setup.
pub fn render_setup_summary(session: &Session) -> String {
    let placement = session.placement();
    let mut out = String::new();
    for ship in ShipType::all() {
        let marker = if ship == placement.active_ship() { '>' } else { ' ' };
        let cells: Vec<String> = placement
            .setup()
            .positions(ship)
            .iter()
            .map(|p| p.to_string())
            .collect();
        let _ = writeln!(
            out,
            "{} {:<10} {}/{} [{}]",
            marker,
            ship.name(),
            placement.setup().count(ship),
            ship.size(),
            cells.join(" ")
        );
    }
    if placement.is_locked() {
        out.push_str("Fleet submitted, waiting for the engine...\n");
    } else if placement.all_ships_placed() {
        out.push_str("All ships placed. Type 'commit' to submit.\n");
    }
    out
}

pub fn render_defense_summary(status: &DefenseStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "State: {} ({})  Attacks received: {}",
        status.state_label(),
        status.state,
        status.total_attacks
    );
    for ship in &status.ships_status {
        let _ = writeln!(
            out,
            "  {:<10} {:<6} {}/{}",
            ship.name,
            if ship.is_sunk { "SUNK" } else { "ACTIVE" },
            ship.hit_count,
            ship.total_positions
        );
    }
    out
}

pub fn render_attack_summary(status: &AttackStatus) -> String {
    let mut out = format!(
        "Attacks: {}  Hits: {}  Misses: {}  Sunk: {}  Accuracy: {:.1}%\n",
        status.total_attacks, status.hits, status.misses, status.sunk_ships, status.accuracy
    );
    if status.game_won {
        out.push_str("VICTORY! Every enemy ship is sunk.\n");
    }
    out
}

/// Full screen for the current mode.
pub fn render(session: &Session) -> String {
    let mut out = format!("== {} | game '{}' ==\n", session.mode(), session.game_id());
    match session.mode() {
        GameMode::Menu => {
            out.push_str("Type 'defense' or 'attack' to start, 'help' for commands.\n");
            return out;
        }
        GameMode::Defense => {
            out.push_str(&render_grid(session));
            match (session.phase(), session.defense_status()) {
                (Phase::Live, Some(status)) => out.push_str(&render_defense_summary(status)),
                _ => out.push_str(&render_setup_summary(session)),
            }
        }
        GameMode::Attack => {
            let target = session.target();
            let _ = writeln!(
                out,
                "Target: {}:{} game '{}'",
                target.host, target.port, target.game_id
            );
            out.push_str(&render_grid(session));
            if let Some(status) = session.attack_status() {
                out.push_str(&render_attack_summary(status));
            }
            if let Some(p) = session.selected() {
                let _ = writeln!(out, "Selected {}. Type 'fire' to attack.", p);
            }
        }
    }
    if session.pending_requests() > 0 {
        let _ = writeln!(out, "({} request(s) pending)", session.pending_requests());
    }
    out.push_str(LEGEND);
    out.push('\n');
    out
}

pub const HELP: &str = "\
Commands:
  defense | attack | menu      switch mode (defense/attack only from the menu)
  ship <b|s|d>                 choose the ship to place
  <cell> | click <cell>        place/remove a cell, or select a target (e.g. B3)
  auto                         place the remaining ships randomly
  clear                        remove the current ship
  commit                       submit the fleet
  target <host> <port> <id>    set the enemy engine and game id
  probe                        check that the target is reachable
  fire                         attack the selected cell
  id <game-id>                 change the local game id
  show | help | quit";
