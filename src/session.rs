//! The client's top-level state machine.
//!
//! A [`Session`] owns everything the player mutates locally (fleet placement,
//! attack selection and target) plus read-only copies of the engine's last
//! reported statuses. Navigation between [`GameMode`]s starts and stops the
//! synchronization channels. No method waits on the network: requests are
//! issued and their completions come back through [`Session::handle`], which
//! re-checks the channel epoch and the current mode before touching any
//! cached state.

use core::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::common::{ClientError, PlacementError};
use crate::config::{ClientConfig, DEFAULT_ENEMY_GAME_ID, DEFAULT_ENEMY_HOST, DEFAULT_ENEMY_PORT};
use crate::fleet::{FleetPlacement, Toggle};
use crate::grid::Position;
use crate::mode::{GameMode, Transition};
use crate::presentation::{derive_all, CellInputs, CellPresentation, Phase};
use crate::protocol::{AttackOrder, PeerHealth};
use crate::ship::ShipType;
use crate::status::{AttackStatus, DefenseStatus};
use crate::sync::{StatusSlot, SyncEvent, SyncManager};
use crate::transport::{EngineApi, PushSource};

/// The remote peer and game we are shooting at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackTarget {
    pub host: String,
    pub port: u16,
    pub game_id: String,
}

impl Default for AttackTarget {
    fn default() -> Self {
        Self {
            host: DEFAULT_ENEMY_HOST.to_string(),
            port: DEFAULT_ENEMY_PORT,
            game_id: DEFAULT_ENEMY_GAME_ID.to_string(),
        }
    }
}

impl AttackTarget {
    fn is_complete(&self) -> bool {
        !self.host.trim().is_empty() && self.port > 0 && !self.game_id.trim().is_empty()
    }
}

/// Why a local action was not carried out. These are expected interactive
/// states, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declined {
    /// The action belongs to another mode or phase.
    WrongMode(GameMode),
    Placement(PlacementError),
    NoSelection,
    IncompleteTarget,
}

impl fmt::Display for Declined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declined::WrongMode(mode) => write!(f, "Not available in {} mode", mode),
            Declined::Placement(err) => write!(f, "{}", err),
            Declined::NoSelection => write!(f, "Select a target cell first"),
            Declined::IncompleteTarget => write!(f, "Target host, port and game id are required"),
        }
    }
}

impl From<PlacementError> for Declined {
    fn from(err: PlacementError) -> Self {
        Declined::Placement(err)
    }
}

/// Result of a fleet commit or attack submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The request is on its way; its result arrives as an [`Update`].
    Sent,
    Declined(Declined),
}

/// What a grid click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Placed(Toggle),
    Targeted(Position),
    Ignored,
}

/// Something visible changed after handling a sync event.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Defense,
    Attack,
    /// The push channel failed or closed; polling remains the fallback.
    PushDegraded(ClientError),
    FleetAccepted,
    /// Setup failed; the fleet is editable again.
    FleetRejected(ClientError),
    AttackReady,
    AttackInitFailed(ClientError),
    AttackSent(Position),
    AttackFailed(Position, ClientError),
    Probed {
        host: String,
        port: u16,
        health: PeerHealth,
    },
}

pub struct Session {
    config: ClientConfig,
    mode: GameMode,
    placement: FleetPlacement,
    defense: StatusSlot<DefenseStatus>,
    attack: Option<AttackStatus>,
    target: AttackTarget,
    selected: Option<Position>,
    sync: SyncManager,
}

impl Session {
    pub fn new(
        config: ClientConfig,
        engine: Arc<dyn EngineApi>,
        push: Arc<dyn PushSource>,
    ) -> Self {
        let sync = SyncManager::new(engine, push, config.poll_interval);
        Self {
            defense: StatusSlot::new(config.ordering),
            config,
            mode: GameMode::Menu,
            placement: FleetPlacement::new(),
            attack: None,
            target: AttackTarget::default(),
            selected: None,
            sync,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn game_id(&self) -> &str {
        &self.config.game_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn placement(&self) -> &FleetPlacement {
        &self.placement
    }

    pub fn defense_status(&self) -> Option<&DefenseStatus> {
        self.defense.get()
    }

    pub fn attack_status(&self) -> Option<&AttackStatus> {
        self.attack.as_ref()
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub fn target(&self) -> &AttackTarget {
        &self.target
    }

    pub fn is_polling(&self) -> bool {
        self.sync.is_polling()
    }

    pub fn is_subscribed(&self) -> bool {
        self.sync.is_subscribed()
    }

    /// Engine requests issued whose result has not been handled yet.
    pub fn pending_requests(&self) -> usize {
        self.sync.in_flight()
    }

    /// Setup until the engine has reported a defense status; attack boards are
    /// always live.
    pub fn phase(&self) -> Phase {
        if self.mode == GameMode::Defense && self.defense.is_empty() {
            Phase::Setup
        } else {
            Phase::Live
        }
    }

    fn editing(&self) -> bool {
        self.mode == GameMode::Defense && self.phase() == Phase::Setup
    }

    /// Presentation of every cell for the current mode.
    pub fn cells(&self) -> Vec<(Position, CellPresentation)> {
        let remote = match self.mode {
            GameMode::Defense => self.defense.get().map(|s| &s.grid),
            GameMode::Attack => self.attack.as_ref().map(|s| &s.grid),
            GameMode::Menu => None,
        };
        derive_all(&CellInputs {
            mode: self.mode,
            phase: self.phase(),
            fleet: self.placement.setup(),
            active: self.placement.active_ship(),
            remote,
            selected: self.selected,
        })
    }

    // Navigation

    /// Enter Defense: show the setup view and open the push channel.
    pub fn enter_defense(&mut self) -> Transition {
        if !self.mode.can_enter(GameMode::Defense) {
            return Transition::Ignored;
        }
        self.sync.close_all();
        self.mode = GameMode::Defense;
        self.defense.clear();
        self.placement.unlock();
        self.sync.open_push(&self.config.game_id);
        log::info!("Entered Defense mode as '{}'", self.config.game_id);
        Transition::Entered(GameMode::Defense)
    }

    /// Enter Attack and initialise the attack game. Its status is fetched
    /// once the engine confirms.
    ///
    /// The mode changes even if initialisation later fails, so the player can
    /// retry from the menu.
    pub fn enter_attack(&mut self) -> Transition {
        if !self.mode.can_enter(GameMode::Attack) {
            return Transition::Ignored;
        }
        self.sync.close_all();
        self.mode = GameMode::Attack;
        self.selected = None;
        log::info!("Entered Attack mode as '{}'", self.config.game_id);
        self.sync.init_attack(&self.config.game_id);
        Transition::Entered(GameMode::Attack)
    }

    /// Return to the menu, releasing the push channel and poll timer.
    pub fn leave_to_menu(&mut self) -> Transition {
        if !self.mode.can_enter(GameMode::Menu) {
            return Transition::Ignored;
        }
        self.sync.close_all();
        log::info!("Left {} mode", self.mode);
        self.mode = GameMode::Menu;
        self.selected = None;
        Transition::Entered(GameMode::Menu)
    }

    /// Switch the local game id. In Defense the channels are reopened under
    /// the new id and the cached status is dropped.
    pub fn set_game_id(&mut self, game_id: &str) -> bool {
        let game_id = game_id.trim();
        if game_id.is_empty() || game_id == self.config.game_id {
            return false;
        }
        self.config.game_id = game_id.to_string();
        if self.mode == GameMode::Defense {
            self.sync.close_all();
            self.defense.clear();
            self.placement.unlock();
            self.sync.open_push(game_id);
        }
        log::info!("Game id is now '{}'", game_id);
        true
    }

    // Fleet placement

    pub fn select_ship_type(&mut self, ship: ShipType) {
        self.placement.select_ship_type(ship);
    }

    pub fn toggle_cell(&mut self, position: Position) -> Toggle {
        if !self.editing() {
            return Toggle::Ignored;
        }
        self.placement.toggle_cell(position)
    }

    /// Route a grid click by mode and phase.
    pub fn click(&mut self, position: Position) -> Click {
        match self.mode {
            GameMode::Defense if self.editing() => Click::Placed(self.placement.toggle_cell(position)),
            GameMode::Attack => {
                self.select_position(position);
                Click::Targeted(position)
            }
            _ => Click::Ignored,
        }
    }

    pub fn auto_place<R: Rng>(&mut self, rng: &mut R) -> Result<(), Declined> {
        if !self.editing() {
            return Err(Declined::WrongMode(self.mode));
        }
        Ok(self.placement.auto_place(rng)?)
    }

    pub fn clear_ship(&mut self) -> Result<(), Declined> {
        if !self.editing() {
            return Err(Declined::WrongMode(self.mode));
        }
        if self.placement.is_locked() {
            return Err(Declined::Placement(PlacementError::Locked));
        }
        self.placement.clear_active();
        Ok(())
    }

    /// Submit the fleet. Nothing is sent unless every ship is placed; the
    /// placement stays locked until the engine answers.
    pub fn commit_fleet(&mut self) -> Outcome {
        if self.mode != GameMode::Defense {
            return Outcome::Declined(Declined::WrongMode(self.mode));
        }
        if self.phase() == Phase::Live {
            return Outcome::Declined(Declined::Placement(PlacementError::Locked));
        }
        let submission = match self.placement.commit(&self.config.game_id) {
            Ok(submission) => submission,
            Err(err) => return Outcome::Declined(err.into()),
        };
        self.sync.submit_fleet(submission);
        Outcome::Sent
    }

    // Attack targeting

    pub fn set_target(&mut self, host: &str, port: u16, game_id: &str) {
        self.target = AttackTarget {
            host: host.trim().to_string(),
            port,
            game_id: game_id.trim().to_string(),
        };
    }

    /// Mark `position` as the next shot. Only meaningful in Attack mode.
    pub fn select_position(&mut self, position: Position) -> bool {
        if self.mode != GameMode::Attack {
            return false;
        }
        self.selected = Some(position);
        true
    }

    /// Fire at the selected cell. The selection is cleared as the request
    /// goes out, and the attack status is re-read from the engine whatever
    /// the outcome.
    pub fn submit_attack(&mut self) -> Outcome {
        if self.mode != GameMode::Attack {
            return Outcome::Declined(Declined::WrongMode(self.mode));
        }
        let Some(position) = self.selected else {
            return Outcome::Declined(Declined::NoSelection);
        };
        if !self.target.is_complete() || self.config.game_id.trim().is_empty() {
            return Outcome::Declined(Declined::IncompleteTarget);
        }
        let order = AttackOrder {
            position,
            enemy_host: self.target.host.clone(),
            enemy_port: self.target.port,
            enemy_game_id: self.target.game_id.clone(),
            game_id: self.config.game_id.clone(),
        };
        self.selected = None;
        self.sync.send_attack(order);
        Outcome::Sent
    }

    /// Health probe against a candidate peer. Game state is untouched.
    pub fn test_connection(&mut self, host: &str, port: u16) {
        self.sync.probe(host.trim(), port);
    }

    pub fn probe_target(&mut self) {
        let AttackTarget { host, port, .. } = self.target.clone();
        self.test_connection(&host, port);
    }

    // Synchronization

    pub async fn next_event(&mut self) -> SyncEvent {
        self.sync.next_event().await
    }

    /// Apply a sync event. Events from a closed channel, or meant for a mode
    /// we have since left, are dropped.
    pub fn handle(&mut self, event: SyncEvent) -> Option<Update> {
        // Probe results carry no session state, so they are reported whenever
        // they land.
        if let SyncEvent::ProbeDone {
            host, port, health, ..
        } = event
        {
            match &health {
                PeerHealth::Healthy => log::info!("Peer {}:{} is healthy", host, port),
                other => log::warn!("Peer {}:{} probe failed: {:?}", host, port, other),
            }
            return Some(Update::Probed { host, port, health });
        }
        if !self.sync.is_current(event.epoch()) {
            log::debug!("Discarding stale event {:?}", event);
            return None;
        }
        match event {
            SyncEvent::PollTick { .. } => {
                if self.mode == GameMode::Defense {
                    self.sync.fetch_defense(&self.config.game_id);
                }
                None
            }
            SyncEvent::DefenseFetched { seq, result, .. } => match result {
                Ok(status) => self.apply_defense(seq, status),
                Err(err) => {
                    log::warn!("Defense status fetch failed: {}", err);
                    None
                }
            },
            SyncEvent::Pushed { seq, status, .. } => self.apply_defense(seq, status),
            SyncEvent::PushFailed { error, .. } => {
                log::warn!("{}", error);
                Some(Update::PushDegraded(error))
            }
            SyncEvent::PushClosed { .. } => {
                log::warn!("Push channel closed by the engine");
                Some(Update::PushDegraded(ClientError::Subscription(
                    "closed by the engine".to_string(),
                )))
            }
            SyncEvent::FleetSubmitted { result, .. } => match result {
                Ok(()) => {
                    log::info!("Fleet submitted for '{}'", self.config.game_id);
                    // The engine tracks this fleet now; keep polling even if
                    // the first read fails.
                    self.sync.fetch_defense(&self.config.game_id);
                    self.sync.start_polling();
                    Some(Update::FleetAccepted)
                }
                Err(err) => {
                    self.placement.unlock();
                    log::error!("Fleet setup failed: {}", err);
                    Some(Update::FleetRejected(err))
                }
            },
            SyncEvent::AttackInitialised { result, .. } => match result {
                Ok(()) => {
                    self.sync.fetch_attack(&self.config.game_id);
                    Some(Update::AttackReady)
                }
                Err(err) => {
                    log::error!("Attack initialisation failed: {}", err);
                    Some(Update::AttackInitFailed(err))
                }
            },
            SyncEvent::AttackSent {
                position, result, ..
            } => {
                self.sync.fetch_attack(&self.config.game_id);
                match result {
                    Ok(receipt) => {
                        log::info!("Attack on {} sent", position);
                        log::debug!("Attack receipt: {}", receipt);
                        Some(Update::AttackSent(position))
                    }
                    Err(err) => {
                        log::error!("Attack on {} failed: {}", position, err);
                        Some(Update::AttackFailed(position, err))
                    }
                }
            }
            SyncEvent::ProbeDone { .. } => None,
            SyncEvent::AttackFetched { result, .. } => {
                if self.mode != GameMode::Attack {
                    log::debug!("Discarding attack status outside Attack mode");
                    return None;
                }
                match result {
                    Ok(status) => {
                        self.attack = Some(status);
                        Some(Update::Attack)
                    }
                    Err(err) => {
                        log::warn!("Attack status fetch failed: {}", err);
                        None
                    }
                }
            }
        }
    }

    fn apply_defense(&mut self, seq: u64, status: DefenseStatus) -> Option<Update> {
        if self.mode != GameMode::Defense {
            log::debug!("Discarding defense status outside Defense mode");
            return None;
        }
        if !self.defense.apply(seq, status) {
            log::debug!("Discarding out-of-order defense status #{}", seq);
            return None;
        }
        self.sync.start_polling();
        Some(Update::Defense)
    }

    /// Handle events until every issued request has completed.
    pub async fn settle(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while self.sync.in_flight() > 0 {
            let event = self.sync.next_event().await;
            updates.extend(self.handle(event));
        }
        updates
    }
}
