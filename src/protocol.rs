//! Request bodies and endpoint paths of the engine's HTTP contract.

use serde::{Deserialize, Serialize};

use crate::fleet::FleetSetup;
use crate::grid::Position;

pub const DEFENSE_SETUP: &str = "/api/defense/setup";
pub const DEFENSE_STATUS: &str = "/api/defense/status";
pub const ATTACK_INIT: &str = "/api/attack/init";
pub const ATTACK_SEND: &str = "/api/attack/send";
pub const ATTACK_STATUS: &str = "/api/attack/status";
pub const HEALTH: &str = "/api/health";
/// Path segment under the websocket root; the game id follows as its own segment.
pub const PUSH: &str = "ws";

/// Body of `POST /api/defense/setup`: the fleet plus our game id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetSubmission {
    #[serde(flatten)]
    pub fleet: FleetSetup,
    pub game_id: String,
}

impl FleetSubmission {
    pub fn new(fleet: FleetSetup, game_id: &str) -> Self {
        Self {
            fleet,
            game_id: game_id.to_string(),
        }
    }
}

/// Body of `POST /api/attack/init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackInit {
    pub game_id: String,
}

/// Body of `POST /api/attack/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOrder {
    pub position: Position,
    pub enemy_host: String,
    pub enemy_port: u16,
    /// Game id of the defender we are shooting at.
    pub enemy_game_id: String,
    /// Our own game id, as the attacker.
    pub game_id: String,
}

/// Outcome of a liveness probe against a target peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerHealth {
    Healthy,
    /// The peer answered, but not with a success status.
    ErrorStatus(u16),
    Unreachable(String),
}

impl PeerHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, PeerHealth::Healthy)
    }
}
