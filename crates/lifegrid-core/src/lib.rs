//! Simulation actor, tick scheduling, snapshot bus, and supervision for
//! the Lifegrid simulation.
//!
//! Each session is served by one actor task that owns its grid outright.
//! Commands, including the actor's own timer wakes, arrive through a
//! single inbox and are applied one at a time, so no lock ever guards the
//! grid.
//!
//! # Modules
//!
//! - [`bounds`] -- Clamping of grid dimensions and tick speed.
//! - [`bus`] -- [`SnapshotBus`]: per-session fan-out of snapshots.
//! - [`command`] -- The closed [`Command`] enum and its failure type.
//! - [`config`] -- Configuration loading from `lifegrid-config.yaml`.
//! - [`scheduler`] -- [`TickScheduler`] trait with Tokio and manual
//!   implementations.
//! - [`state`] -- [`SimulationState`]: the command state machine.
//! - [`actor`] -- The actor task and its [`ActorHandle`].
//! - [`supervisor`] -- [`SessionSupervisor`]: spawn, monitor, restart.
//!
//! [`SnapshotBus`]: bus::SnapshotBus
//! [`Command`]: command::Command
//! [`TickScheduler`]: scheduler::TickScheduler
//! [`SimulationState`]: state::SimulationState
//! [`ActorHandle`]: actor::ActorHandle
//! [`SessionSupervisor`]: supervisor::SessionSupervisor

pub mod actor;
pub mod bounds;
pub mod bus;
pub mod command;
pub mod config;
pub mod scheduler;
pub mod state;
pub mod supervisor;
