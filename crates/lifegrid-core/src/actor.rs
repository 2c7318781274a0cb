//! The simulation actor task and the handle used to talk to it.
//!
//! One actor serves one session. It owns a [`SimulationState`] outright
//! and drains a bounded mpsc inbox, applying one message at a time. Timer
//! wakes travel through the same inbox as external commands, so ordering
//! is simply delivery order.
//!
//! Every request made through an [`ActorHandle`] waits for a one-shot
//! reply carrying the resulting [`Snapshot`], bounded by the configured
//! reply timeout.

use std::time::Duration;

use lifegrid_grid::Grid;
use lifegrid_types::{Cell, Dimensions, SessionId, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, trace};

use crate::bus::SnapshotBus;
use crate::command::{Command, CommandError, Message, Reply};
use crate::config::{InitialGrid, SimulationConfig};
use crate::scheduler::TokioTickScheduler;
use crate::state::{SimulationSettings, SimulationState};

/// Errors surfaced to callers of an [`ActorHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// The actor has terminated (or is being restarted).
    #[error("simulation actor is unavailable")]
    Unavailable,

    /// The actor did not reply in time.
    #[error("simulation actor did not reply within {timeout_ms} ms")]
    Timeout {
        /// The bound that elapsed.
        timeout_ms: u64,
    },

    /// No catalog pattern has the requested key.
    #[error("pattern not found: {key}")]
    PatternNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// A toggle targeted a cell outside the grid.
    #[error("cell {cell} is outside the {}x{} grid", .dims.rows, .dims.cols)]
    CellOutOfBounds {
        /// The requested cell.
        cell: Cell,
        /// The grid size at the time of the request.
        dims: Dimensions,
    },
}

impl From<CommandError> for ActorError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::PatternNotFound { key } => Self::PatternNotFound { key },
            CommandError::CellOutOfBounds { cell, dims } => Self::CellOutOfBounds { cell, dims },
        }
    }
}

/// Tuning shared by every actor the supervisor spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorConfig {
    /// Longest a request waits for its reply.
    pub reply_timeout: Duration,
    /// Capacity of the command inbox.
    pub inbox_capacity: usize,
    /// Seed for the actor's random source. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl From<&SimulationConfig> for ActorConfig {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            reply_timeout: Duration::from_millis(config.reply_timeout_ms),
            inbox_capacity: config.inbox_capacity,
            seed: config.seed,
        }
    }
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// Cloneable address of one running actor.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    session: SessionId,
    inbox: mpsc::Sender<Message>,
    bus: SnapshotBus,
    reply_timeout: Duration,
}

impl ActorHandle {
    /// Session this actor serves.
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Whether the actor loop is still accepting messages.
    pub fn is_alive(&self) -> bool {
        !self.inbox.is_closed()
    }

    /// Stream of snapshots published after every state change.
    ///
    /// The stream ends when the session's topic is closed, which happens
    /// when the actor is replaced or the session ends. Subscribing after
    /// that yields a stream that has already ended.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.bus.subscribe(self.session)
    }

    /// Send a command and wait for the resulting snapshot.
    pub async fn request(&self, command: Command) -> Result<Snapshot, ActorError> {
        let (reply, response) = oneshot::channel();
        let exchange = async {
            self.inbox
                .send(Message::Command {
                    command,
                    reply: Some(reply),
                })
                .await
                .map_err(|_err| ActorError::Unavailable)?;
            let result = response.await.map_err(|_err| ActorError::Unavailable)?;
            result.map_err(ActorError::from)
        };

        tokio::time::timeout(self.reply_timeout, exchange)
            .await
            .map_err(|_elapsed| ActorError::Timeout {
                timeout_ms: u64::try_from(self.reply_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    /// Current state.
    pub async fn get_state(&self) -> Result<Snapshot, ActorError> {
        self.request(Command::GetState).await
    }

    /// Begin advancing on the timer.
    pub async fn start_running(&self) -> Result<Snapshot, ActorError> {
        self.request(Command::Start).await
    }

    /// Stop advancing.
    pub async fn stop_running(&self) -> Result<Snapshot, ActorError> {
        self.request(Command::Stop).await
    }

    /// Evolve one generation. Ignored while running.
    pub async fn step(&self) -> Result<Snapshot, ActorError> {
        self.request(Command::Step).await
    }

    /// Reseed the grid randomly and stop.
    pub async fn randomize(&self) -> Result<Snapshot, ActorError> {
        self.request(Command::Randomize).await
    }

    /// Kill every cell and stop.
    pub async fn clear(&self) -> Result<Snapshot, ActorError> {
        self.request(Command::Clear).await
    }

    /// Flip one cell.
    pub async fn toggle_cell(&self, row: u32, col: u32) -> Result<Snapshot, ActorError> {
        self.request(Command::ToggleCell { row, col }).await
    }

    /// Change the tick delay. Clamped to `50..=2000` ms.
    pub async fn set_speed(&self, tick_ms: i64) -> Result<Snapshot, ActorError> {
        self.request(Command::SetSpeed { tick_ms }).await
    }

    /// Resize and reseed the grid, then stop. Clamped to `5..=100` per axis.
    pub async fn resize(&self, rows: i64, cols: i64) -> Result<Snapshot, ActorError> {
        self.request(Command::Resize { rows, cols }).await
    }

    /// Replace the grid with a catalog pattern, then stop.
    pub async fn load_pattern(&self, key: &str) -> Result<Snapshot, ActorError> {
        self.request(Command::LoadPattern {
            key: key.to_owned(),
        })
        .await
    }

    /// Ask the actor loop to exit after the messages already queued.
    pub async fn shutdown(&self) -> Result<(), ActorError> {
        self.inbox
            .send(Message::Shutdown)
            .await
            .map_err(|_err| ActorError::Unavailable)
    }
}

/// A freshly spawned actor.
#[derive(Debug)]
pub struct SpawnedActor {
    /// Address of the actor.
    pub handle: ActorHandle,
    /// The actor task. Completes when the loop exits.
    pub task: JoinHandle<()>,
    /// Latest size and speed, updated after every change.
    pub settings: watch::Receiver<SimulationSettings>,
}

/// Spawn an actor for `session` on the current Tokio runtime.
///
/// Opens the session's topic on `bus` if it is not already open.
pub fn spawn_actor(
    session: SessionId,
    settings: SimulationSettings,
    initial: InitialGrid,
    config: &ActorConfig,
    bus: SnapshotBus,
) -> SpawnedActor {
    let mut rng = config
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let grid = match initial {
        InitialGrid::Random => Grid::random(settings.dimensions(), &mut rng),
        InitialGrid::Empty => Grid::empty(),
    };
    let state = SimulationState::new(settings, grid);

    bus.open(session);
    let (inbox_tx, inbox_rx) = mpsc::channel(config.inbox_capacity.max(1));
    let (settings_tx, settings_rx) = watch::channel(state.settings());
    let scheduler = TokioTickScheduler::new(inbox_tx.downgrade());

    let actor = Actor {
        session,
        state,
        scheduler,
        rng,
        bus: bus.clone(),
        settings: settings_tx,
    };
    let span = info_span!("actor", session = %session);
    let task = tokio::spawn(actor.run(inbox_rx).instrument(span));

    SpawnedActor {
        handle: ActorHandle {
            session,
            inbox: inbox_tx,
            bus,
            reply_timeout: config.reply_timeout,
        },
        task,
        settings: settings_rx,
    }
}

/// Everything the actor loop owns.
struct Actor {
    session: SessionId,
    state: SimulationState,
    scheduler: TokioTickScheduler,
    rng: StdRng,
    bus: SnapshotBus,
    settings: watch::Sender<SimulationSettings>,
}

impl Actor {
    async fn run(mut self, mut inbox: mpsc::Receiver<Message>) {
        info!(
            rows = self.state.dimensions().rows,
            cols = self.state.dimensions().cols,
            alive = self.state.grid().alive_count(),
            "simulation actor started"
        );

        while let Some(message) = inbox.recv().await {
            let Message::Command { command, reply } = message else {
                debug!("shutdown requested");
                break;
            };
            self.handle(command, reply);
        }

        self.state.cancel_timer(&mut self.scheduler);
        info!(generation = self.state.generation(), "simulation actor stopped");
    }

    fn handle(&mut self, command: Command, reply: Option<Reply>) {
        let name = command.name();
        let outcome = self
            .state
            .dispatch(command, &mut self.scheduler, &mut self.rng);
        let snapshot = self.state.snapshot();

        if outcome.publish {
            let receivers = self.bus.publish(self.session, snapshot.clone());
            trace!(receivers, "snapshot published");
        }

        let current = self.state.settings();
        self.settings.send_if_modified(|last| {
            if *last == current {
                false
            } else {
                *last = current;
                true
            }
        });

        debug!(
            command = name,
            generation = snapshot.generation,
            running = snapshot.running,
            published = outcome.publish,
            "command handled"
        );

        if let Some(reply) = reply {
            // The caller may have timed out and gone away.
            let _ = reply.send(outcome.result.map(|()| snapshot));
        }
    }
}
