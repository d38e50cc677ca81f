pub mod command;
mod common;
mod config;
mod fleet;
mod grid;
mod logging;
mod mode;
pub mod presentation;
pub mod protocol;
pub mod session;
mod ship;
mod status;
pub mod sync;
pub mod transport;
pub mod ui;

pub use common::*;
pub use config::*;
pub use fleet::*;
pub use grid::*;
pub use logging::{init_logging, level_from, LOG_ENV};
pub use mode::*;
pub use ship::*;
pub use status::*;
pub use session::{AttackTarget, Click, Declined, Outcome, Session, Update};
pub use sync::{StatusSlot, SyncEvent, UpdateOrdering};
pub use transport::http::HttpEngine;
pub use transport::in_memory::{InMemoryEngine, InMemoryPush};
pub use transport::websocket::WsPushSource;
pub use transport::{EngineApi, PushSource, PushStream};
