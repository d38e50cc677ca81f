//! The seam between the client and the remote engine.
//!
//! [`EngineApi`] covers the request/response calls, [`PushSource`] the
//! per-game status stream. Production code talks HTTP and websockets; tests
//! use the in-memory doubles.

use crate::common::ClientError;
use crate::protocol::{AttackOrder, FleetSubmission, PeerHealth};
use crate::status::{AttackStatus, DefenseStatus};

pub mod http;
pub mod in_memory;
pub mod websocket;

#[async_trait::async_trait]
pub trait EngineApi: Send + Sync {
    async fn setup_fleet(&self, submission: &FleetSubmission) -> Result<(), ClientError>;
    async fn defense_status(&self, game_id: &str) -> Result<DefenseStatus, ClientError>;
    async fn init_attack(&self, game_id: &str) -> Result<(), ClientError>;
    /// Fire at the target. The returned receipt is informational only.
    async fn send_attack(&self, order: &AttackOrder) -> Result<serde_json::Value, ClientError>;
    async fn attack_status(&self, game_id: &str) -> Result<AttackStatus, ClientError>;
    /// Liveness probe against a peer engine, not the local one.
    async fn probe_peer(&self, host: &str, port: u16) -> PeerHealth;
}

/// Opens push subscriptions for a game id.
#[async_trait::async_trait]
pub trait PushSource: Send + Sync {
    async fn subscribe(&self, game_id: &str) -> Result<Box<dyn PushStream>, ClientError>;
}

/// An open push subscription. Dropping it closes the channel.
#[async_trait::async_trait]
pub trait PushStream: Send {
    /// Next pushed status; `None` once the server closes the stream.
    async fn next_status(&mut self) -> Option<Result<DefenseStatus, ClientError>>;
}
