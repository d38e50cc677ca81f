//! Error types shared by the placement validator and the engine transports.

use core::fmt;

use crate::ship::ShipType;

/// Local precondition violations raised by the fleet placement validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Commit attempted while this ship still lacks positions.
    FleetIncomplete(ShipType),
    /// The fleet was already committed and is waiting on the engine.
    Locked,
    /// No straight run of free cells is left for this ship.
    NoRoom(ShipType),
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::FleetIncomplete(ship) => {
                write!(f, "{} is not fully placed ({} cells needed)", ship, ship.size())
            }
            PlacementError::Locked => write!(f, "Fleet already submitted"),
            PlacementError::NoRoom(ship) => {
                write!(f, "No free straight run of {} cells left for {}", ship.size(), ship)
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Failures talking to the remote engine or a target peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-success status.
    Http { status: u16, body: String },
    /// The request never produced a response (refused, reset, timed out).
    Network(String),
    /// The response body did not match the expected payload.
    Decode(String),
    /// The push channel could not be opened or broke while open.
    Subscription(String),
}

impl ClientError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        ClientError::Http {
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http { status, body } if body.is_empty() => write!(f, "HTTP {}", status),
            ClientError::Http { status, body } => write!(f, "HTTP {} - {}", status, body),
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Decode(msg) => write!(f, "Malformed response: {}", msg),
            ClientError::Subscription(msg) => write!(f, "Push channel error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
