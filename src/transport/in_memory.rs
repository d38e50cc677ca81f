//! In-process stand-ins for the engine and its push channel.
//!
//! [`InMemoryEngine`] keeps just enough bookkeeping to answer the client's
//! calls (registered fleets, attack counters, cell marks) and records every
//! request so callers can assert on traffic. [`InMemoryPush`] hands out
//! channel-backed subscriptions and lets the owner push statuses into them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::common::ClientError;
use crate::protocol::{AttackOrder, FleetSubmission, PeerHealth};
use crate::ship::ShipType;
use crate::status::{AttackStatus, CellMark, DefenseStatus, ShipStatus};
use crate::transport::{EngineApi, PushSource, PushStream};

#[derive(Default)]
struct EngineState {
    defense: HashMap<String, DefenseStatus>,
    attack: HashMap<String, AttackStatus>,
    setups: Vec<FleetSubmission>,
    orders: Vec<AttackOrder>,
    inits: Vec<String>,
    defense_fetches: usize,
    attack_fetches: usize,
    peers: HashSet<(String, u16)>,
    fail_next: Option<ClientError>,
}

/// Shared handle; clones observe the same engine.
#[derive(Clone, Default)]
pub struct InMemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next engine call fail with `err`.
    pub fn fail_next(&self, err: ClientError) {
        self.lock().fail_next = Some(err);
    }

    fn take_failure(&self) -> Result<(), ClientError> {
        match self.lock().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn set_defense_status(&self, game_id: &str, status: DefenseStatus) {
        self.lock().defense.insert(game_id.to_string(), status);
    }

    pub fn set_attack_status(&self, game_id: &str, status: AttackStatus) {
        self.lock().attack.insert(game_id.to_string(), status);
    }

    /// Register a peer that answers health probes.
    pub fn add_peer(&self, host: &str, port: u16) {
        self.lock().peers.insert((host.to_string(), port));
    }

    pub fn setups(&self) -> Vec<FleetSubmission> {
        self.lock().setups.clone()
    }

    pub fn orders(&self) -> Vec<AttackOrder> {
        self.lock().orders.clone()
    }

    pub fn inits(&self) -> Vec<String> {
        self.lock().inits.clone()
    }

    pub fn defense_fetches(&self) -> usize {
        self.lock().defense_fetches
    }

    pub fn attack_fetches(&self) -> usize {
        self.lock().attack_fetches
    }
}

fn defense_from(submission: &FleetSubmission) -> DefenseStatus {
    let ships_status = ShipType::all()
        .map(|ship| {
            let positions: Vec<_> = submission.fleet.positions(ship).iter().collect();
            ShipStatus {
                name: ship.name().to_string(),
                is_sunk: false,
                hit_count: 0,
                total_positions: positions.len() as u32,
                positions,
                hits: Vec::new(),
            }
        })
        .collect();
    DefenseStatus {
        state: "q1".to_string(),
        total_attacks: 0,
        ships_status,
        grid: Default::default(),
    }
}

#[async_trait::async_trait]
impl EngineApi for InMemoryEngine {
    async fn setup_fleet(&self, submission: &FleetSubmission) -> Result<(), ClientError> {
        self.take_failure()?;
        let mut state = self.lock();
        state
            .defense
            .insert(submission.game_id.clone(), defense_from(submission));
        state.setups.push(submission.clone());
        Ok(())
    }

    async fn defense_status(&self, game_id: &str) -> Result<DefenseStatus, ClientError> {
        self.take_failure()?;
        let mut state = self.lock();
        state.defense_fetches += 1;
        state
            .defense
            .get(game_id)
            .cloned()
            .ok_or_else(|| ClientError::http(404, r#"{"detail":"Game not found"}"#))
    }

    async fn init_attack(&self, game_id: &str) -> Result<(), ClientError> {
        self.take_failure()?;
        let mut state = self.lock();
        state.inits.push(game_id.to_string());
        state.attack.insert(game_id.to_string(), AttackStatus::fresh());
        Ok(())
    }

    /// Records the order and counts it as a miss; hit detection lives with
    /// the real engine.
    async fn send_attack(&self, order: &AttackOrder) -> Result<serde_json::Value, ClientError> {
        self.take_failure()?;
        let mut state = self.lock();
        let status = state
            .attack
            .get_mut(&order.game_id)
            .ok_or_else(|| ClientError::http(404, r#"{"detail":"Attack game not found"}"#))?;
        if status.grid.mark(order.position) != CellMark::Empty {
            return Err(ClientError::http(
                400,
                r#"{"detail":"Position already attacked"}"#,
            ));
        }
        status.grid.set(order.position, CellMark::Miss);
        status.total_attacks += 1;
        status.misses += 1;
        status.accuracy = status.hits as f64 / status.total_attacks as f64 * 100.0;
        state.orders.push(order.clone());
        Ok(serde_json::json!({
            "position": order.position,
            "response": "404-failed",
            "game_won": false,
        }))
    }

    async fn attack_status(&self, game_id: &str) -> Result<AttackStatus, ClientError> {
        self.take_failure()?;
        let mut state = self.lock();
        state.attack_fetches += 1;
        state
            .attack
            .get(game_id)
            .cloned()
            .ok_or_else(|| ClientError::http(404, r#"{"detail":"Attack game not found"}"#))
    }

    async fn probe_peer(&self, host: &str, port: u16) -> PeerHealth {
        if self.lock().peers.contains(&(host.to_string(), port)) {
            PeerHealth::Healthy
        } else {
            PeerHealth::Unreachable(format!("connection refused: {}:{}", host, port))
        }
    }
}

type Subscriber = (String, UnboundedSender<Result<DefenseStatus, ClientError>>);

#[derive(Default)]
struct PushState {
    subscribers: Vec<Subscriber>,
    opened: usize,
    refuse: bool,
}

/// Channel-backed push source. Clones share subscribers.
#[derive(Clone, Default)]
pub struct InMemoryPush {
    state: Arc<Mutex<PushState>>,
}

impl InMemoryPush {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PushState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Refuse all further subscription attempts.
    pub fn refuse_subscriptions(&self) {
        self.lock().refuse = true;
    }

    /// Deliver `status` to every live subscriber of `game_id`; returns how
    /// many received it.
    pub fn push(&self, game_id: &str, status: DefenseStatus) -> usize {
        self.send(game_id, Ok(status))
    }

    /// Break every live subscription of `game_id` with `err`.
    pub fn fail(&self, game_id: &str, err: ClientError) -> usize {
        self.send(game_id, Err(err))
    }

    fn send(&self, game_id: &str, item: Result<DefenseStatus, ClientError>) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|(_, tx)| !tx.is_closed());
        state
            .subscribers
            .iter()
            .filter(|(id, _)| id == game_id)
            .filter(|(_, tx)| tx.send(item.clone()).is_ok())
            .count()
    }

    /// Subscriptions for `game_id` whose receiving end is still alive.
    pub fn open_count(&self, game_id: &str) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|(_, tx)| !tx.is_closed());
        state
            .subscribers
            .iter()
            .filter(|(id, _)| id == game_id)
            .count()
    }

    /// Total subscriptions ever opened.
    pub fn opened(&self) -> usize {
        self.lock().opened
    }
}

#[async_trait::async_trait]
impl PushSource for InMemoryPush {
    async fn subscribe(&self, game_id: &str) -> Result<Box<dyn PushStream>, ClientError> {
        let mut state = self.lock();
        if state.refuse {
            return Err(ClientError::Subscription(format!(
                "subscription to '{}' refused",
                game_id
            )));
        }
        let (tx, rx) = unbounded_channel();
        state.subscribers.push((game_id.to_string(), tx));
        state.opened += 1;
        Ok(Box::new(InMemoryPushStream { rx }))
    }
}

struct InMemoryPushStream {
    rx: UnboundedReceiver<Result<DefenseStatus, ClientError>>,
}

#[async_trait::async_trait]
impl PushStream for InMemoryPushStream {
    async fn next_status(&mut self) -> Option<Result<DefenseStatus, ClientError>> {
        self.rx.recv().await
    }
}
