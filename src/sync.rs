//! Remote status synchronization and request dispatch.
//!
//! The [`SyncManager`] owns the Defense push subscription, the Defense poll
//! timer and every in-flight engine request. Requests are spawned rather than
//! awaited, so the caller stays free to handle input while they run.
//! Completions come back as [`SyncEvent`]s on one channel, stamped with the
//! channel epoch they were issued under; closing the channels bumps the
//! epoch, so anything that arrives afterwards from an abandoned channel is
//! recognisably stale.
//!
//! Requests already issued are never cancelled. Only the push reader task and
//! the poll timer are torn down.

use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::common::ClientError;
use crate::grid::Position;
use crate::protocol::{AttackOrder, FleetSubmission, PeerHealth};
use crate::status::{AttackStatus, DefenseStatus};
use crate::transport::{EngineApi, PushSource};

/// How competing Defense updates are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOrdering {
    /// Whichever completion is applied last wins.
    #[default]
    LastWriteWins,
    /// Updates carry a monotonic stamp (issue time for fetches, receipt time
    /// for pushes); anything older than the held status is dropped.
    Sequenced,
}

impl FromStr for UpdateOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "lww" => Ok(UpdateOrdering::LastWriteWins),
            "sequenced" | "seq" => Ok(UpdateOrdering::Sequenced),
            other => Err(format!(
                "unknown ordering '{}' - expected last-write-wins or sequenced",
                other
            )),
        }
    }
}

/// Cached remote status with its ordering stamp.
#[derive(Debug, Clone)]
pub struct StatusSlot<T> {
    value: Option<T>,
    seq: u64,
    ordering: UpdateOrdering,
}

impl<T> StatusSlot<T> {
    pub fn new(ordering: UpdateOrdering) -> Self {
        Self {
            value: None,
            seq: 0,
            ordering,
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Replace the held value wholesale. Returns `false` if the update was
    /// stale under the slot's ordering and got dropped.
    pub fn apply(&mut self, seq: u64, value: T) -> bool {
        if self.ordering == UpdateOrdering::Sequenced && seq < self.seq {
            return false;
        }
        self.seq = self.seq.max(seq);
        self.value = Some(value);
        true
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

/// Completions and timer ticks delivered to the session.
#[derive(Debug)]
pub enum SyncEvent {
    PollTick {
        epoch: u64,
    },
    DefenseFetched {
        epoch: u64,
        seq: u64,
        result: Result<DefenseStatus, ClientError>,
    },
    Pushed {
        epoch: u64,
        seq: u64,
        status: DefenseStatus,
    },
    PushFailed {
        epoch: u64,
        error: ClientError,
    },
    PushClosed {
        epoch: u64,
    },
    AttackFetched {
        epoch: u64,
        result: Result<AttackStatus, ClientError>,
    },
    FleetSubmitted {
        epoch: u64,
        result: Result<(), ClientError>,
    },
    AttackInitialised {
        epoch: u64,
        result: Result<(), ClientError>,
    },
    AttackSent {
        epoch: u64,
        position: Position,
        result: Result<serde_json::Value, ClientError>,
    },
    ProbeDone {
        epoch: u64,
        host: String,
        port: u16,
        health: PeerHealth,
    },
}

impl SyncEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            SyncEvent::PollTick { epoch }
            | SyncEvent::DefenseFetched { epoch, .. }
            | SyncEvent::Pushed { epoch, .. }
            | SyncEvent::PushFailed { epoch, .. }
            | SyncEvent::PushClosed { epoch }
            | SyncEvent::AttackFetched { epoch, .. }
            | SyncEvent::FleetSubmitted { epoch, .. }
            | SyncEvent::AttackInitialised { epoch, .. }
            | SyncEvent::AttackSent { epoch, .. }
            | SyncEvent::ProbeDone { epoch, .. } => *epoch,
        }
    }

    /// Whether this event settles a request counted in [`SyncManager::in_flight`].
    fn completes_request(&self) -> bool {
        !matches!(
            self,
            SyncEvent::PollTick { .. }
                | SyncEvent::Pushed { .. }
                | SyncEvent::PushFailed { .. }
                | SyncEvent::PushClosed { .. }
        )
    }
}

pub struct SyncManager {
    engine: Arc<dyn EngineApi>,
    push: Arc<dyn PushSource>,
    tx: UnboundedSender<SyncEvent>,
    rx: UnboundedReceiver<SyncEvent>,
    epoch: u64,
    seq: Arc<AtomicU64>,
    poll_interval: Duration,
    poll: Option<Interval>,
    push_task: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl SyncManager {
    pub fn new(
        engine: Arc<dyn EngineApi>,
        push: Arc<dyn PushSource>,
        poll_interval: Duration,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            engine,
            push,
            tx,
            rx,
            epoch: 0,
            seq: Arc::new(AtomicU64::new(0)),
            poll_interval,
            poll: None,
            push_task: None,
            in_flight: 0,
        }
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn is_subscribed(&self) -> bool {
        self.push_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Requests issued whose completion has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Open the push subscription for `game_id`, replacing any open one.
    pub fn open_push(&mut self, game_id: &str) {
        self.close_push();
        let push = Arc::clone(&self.push);
        let tx = self.tx.clone();
        let seq = Arc::clone(&self.seq);
        let epoch = self.epoch;
        let game_id = game_id.to_string();
        self.push_task = Some(tokio::spawn(async move {
            let mut stream = match push.subscribe(&game_id).await {
                Ok(stream) => stream,
                Err(error) => {
                    let _ = tx.send(SyncEvent::PushFailed { epoch, error });
                    return;
                }
            };
            while let Some(item) = stream.next_status().await {
                let event = match item {
                    Ok(status) => SyncEvent::Pushed {
                        epoch,
                        seq: seq.fetch_add(1, Ordering::SeqCst) + 1,
                        status,
                    },
                    Err(error) => SyncEvent::PushFailed { epoch, error },
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            let _ = tx.send(SyncEvent::PushClosed { epoch });
        }));
    }

    fn close_push(&mut self) {
        if let Some(task) = self.push_task.take() {
            task.abort();
        }
    }

    /// Start the poll timer if it is not already running. The first tick
    /// fires one full interval from now.
    pub fn start_polling(&mut self) {
        if self.poll.is_some() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.poll = Some(ticker);
    }

    /// Tear down the push subscription and poll timer and start a new epoch,
    /// so completions issued before this call are recognised as stale.
    pub fn close_all(&mut self) {
        self.close_push();
        self.poll = None;
        self.epoch += 1;
    }

    /// Run `request` in the background and queue its completion event.
    fn spawn_request<F>(&mut self, request: F)
    where
        F: Future<Output = SyncEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let _ = tx.send(request.await);
        });
    }

    pub fn fetch_defense(&mut self, game_id: &str) {
        let engine = Arc::clone(&self.engine);
        let epoch = self.epoch;
        let seq = self.next_seq();
        let game_id = game_id.to_string();
        self.spawn_request(async move {
            let result = engine.defense_status(&game_id).await;
            SyncEvent::DefenseFetched { epoch, seq, result }
        });
    }

    pub fn fetch_attack(&mut self, game_id: &str) {
        let engine = Arc::clone(&self.engine);
        let epoch = self.epoch;
        let game_id = game_id.to_string();
        self.spawn_request(async move {
            let result = engine.attack_status(&game_id).await;
            SyncEvent::AttackFetched { epoch, result }
        });
    }

    pub fn submit_fleet(&mut self, submission: FleetSubmission) {
        let engine = Arc::clone(&self.engine);
        let epoch = self.epoch;
        self.spawn_request(async move {
            let result = engine.setup_fleet(&submission).await;
            SyncEvent::FleetSubmitted { epoch, result }
        });
    }

    pub fn init_attack(&mut self, game_id: &str) {
        let engine = Arc::clone(&self.engine);
        let epoch = self.epoch;
        let game_id = game_id.to_string();
        self.spawn_request(async move {
            let result = engine.init_attack(&game_id).await;
            SyncEvent::AttackInitialised { epoch, result }
        });
    }

    pub fn send_attack(&mut self, order: AttackOrder) {
        let engine = Arc::clone(&self.engine);
        let epoch = self.epoch;
        self.spawn_request(async move {
            let result = engine.send_attack(&order).await;
            SyncEvent::AttackSent {
                epoch,
                position: order.position,
                result,
            }
        });
    }

    pub fn probe(&mut self, host: &str, port: u16) {
        let engine = Arc::clone(&self.engine);
        let epoch = self.epoch;
        let host = host.to_string();
        self.spawn_request(async move {
            let health = engine.probe_peer(&host, port).await;
            SyncEvent::ProbeDone {
                epoch,
                host,
                port,
                health,
            }
        });
    }

    /// Wait for the next completion or poll tick.
    pub async fn next_event(&mut self) -> SyncEvent {
        let event = match self.poll.as_mut() {
            Some(ticker) => tokio::select! {
                event = self.rx.recv() => event,
                _ = ticker.tick() => Some(SyncEvent::PollTick { epoch: self.epoch }),
            },
            None => self.rx.recv().await,
        };
        // The manager holds a sender, so the channel never closes.
        let event = match event {
            Some(event) => event,
            None => std::future::pending().await,
        };
        if event.completes_request() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        event
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        self.close_push();
    }
}
