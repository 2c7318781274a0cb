//! Session supervision: spawn, monitor, and restart simulation actors.
//!
//! A session outlives the actors that serve it. Each session gets a
//! monitor task that awaits its current actor task:
//!
//! - **Normal exit** (shutdown, or every handle dropped): the session is
//!   removed and its bus topic closed.
//! - **Abnormal exit** (panic or abort): the topic is closed so existing
//!   subscribers see end-of-stream, and after the restart delay a fresh
//!   actor is spawned with the last known size and speed on a newly
//!   randomized grid. The new handle is published on the session's watch
//!   channel. Generation and cells are not carried over.
//!
//! Restarts per session are capped by `max_restarts` (0 means unlimited).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lifegrid_types::SessionId;
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{Instrument, error, info, info_span, warn};

use crate::actor::{ActorConfig, ActorHandle, SpawnedActor, spawn_actor};
use crate::bus::SnapshotBus;
use crate::config::{InitialGrid, LifegridConfig};
use crate::state::SimulationSettings;

/// Errors from session supervision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SupervisorError {
    /// No live session has this id.
    #[error("session not found: {session}")]
    SessionNotFound {
        /// The id that was looked up.
        session: SessionId,
    },
}

/// Public view of one live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// When the session was started.
    pub created_at: DateTime<Utc>,
    /// Times the actor has been restarted.
    pub restarts: u32,
    /// Last reported size and speed.
    pub settings: SimulationSettings,
}

/// Bookkeeping for one live session.
#[derive(Debug)]
struct SessionEntry {
    handle: watch::Sender<ActorHandle>,
    settings: watch::Receiver<SimulationSettings>,
    abort: AbortHandle,
    created_at: DateTime<Utc>,
    restarts: u32,
}

#[derive(Debug)]
struct Inner {
    sessions: RwLock<BTreeMap<SessionId, SessionEntry>>,
    bus: SnapshotBus,
    actor: ActorConfig,
    initial_grid: InitialGrid,
    defaults: SimulationSettings,
    max_restarts: u32,
    restart_delay: Duration,
}

/// Owner of every live session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionSupervisor {
    inner: Arc<Inner>,
}

impl SessionSupervisor {
    /// Supervisor publishing through `bus`, configured from `config`.
    pub fn new(config: &LifegridConfig, bus: SnapshotBus) -> Self {
        let simulation = &config.simulation;
        let defaults = SimulationSettings::clamped(
            i64::from(simulation.rows),
            i64::from(simulation.cols),
            i64::try_from(simulation.tick_ms).unwrap_or(i64::MAX),
        );
        Self {
            inner: Arc::new(Inner {
                sessions: RwLock::new(BTreeMap::new()),
                bus,
                actor: ActorConfig::from(simulation),
                initial_grid: simulation.initial_grid,
                defaults,
                max_restarts: config.supervisor.max_restarts,
                restart_delay: Duration::from_millis(config.supervisor.restart_delay_ms),
            }),
        }
    }

    /// The bus every actor of this supervisor publishes to.
    pub fn bus(&self) -> &SnapshotBus {
        &self.inner.bus
    }

    /// Size and speed used when a caller does not provide them.
    pub fn default_settings(&self) -> SimulationSettings {
        self.inner.defaults
    }

    /// Spawn a new session. Inputs are clamped into bounds.
    pub async fn start_session(
        &self,
        rows: i64,
        cols: i64,
        tick_ms: i64,
    ) -> (SessionId, ActorHandle) {
        let session = SessionId::new();
        let settings = SimulationSettings::clamped(rows, cols, tick_ms);
        let SpawnedActor {
            handle,
            task,
            settings: settings_rx,
        } = spawn_actor(
            session,
            settings,
            self.inner.initial_grid,
            &self.inner.actor,
            self.inner.bus.clone(),
        );

        let entry = SessionEntry {
            handle: watch::Sender::new(handle.clone()),
            settings: settings_rx.clone(),
            abort: task.abort_handle(),
            created_at: Utc::now(),
            restarts: 0,
        };
        self.inner.sessions.write().await.insert(session, entry);

        let span = info_span!("supervisor", session = %session);
        tokio::spawn(monitor(Arc::clone(&self.inner), session, task, settings_rx).instrument(span));

        info!(
            session = %session,
            rows = settings.rows,
            cols = settings.cols,
            tick_ms = settings.tick_ms,
            "session started"
        );
        (session, handle)
    }

    /// Current handle of a session.
    pub async fn handle(&self, session: SessionId) -> Result<ActorHandle, SupervisorError> {
        let sessions = self.inner.sessions.read().await;
        sessions
            .get(&session)
            .map(|entry| entry.handle.borrow().clone())
            .ok_or(SupervisorError::SessionNotFound { session })
    }

    /// Receiver that yields a new handle whenever the actor is replaced.
    ///
    /// `changed()` fails once the session is gone for good.
    pub async fn watch(
        &self,
        session: SessionId,
    ) -> Result<watch::Receiver<ActorHandle>, SupervisorError> {
        let sessions = self.inner.sessions.read().await;
        sessions
            .get(&session)
            .map(|entry| entry.handle.subscribe())
            .ok_or(SupervisorError::SessionNotFound { session })
    }

    /// Live sessions, ordered by id (time-ordered UUIDs).
    pub async fn sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.inner.sessions.read().await;
        sessions
            .iter()
            .map(|(&id, entry)| SessionSummary {
                id,
                created_at: entry.created_at,
                restarts: entry.restarts,
                settings: *entry.settings.borrow(),
            })
            .collect()
    }

    /// End a session gracefully. The actor is not restarted.
    pub async fn end_session(&self, session: SessionId) -> Result<(), SupervisorError> {
        let entry = self
            .inner
            .sessions
            .write()
            .await
            .remove(&session)
            .ok_or(SupervisorError::SessionNotFound { session })?;

        let handle = entry.handle.borrow().clone();
        if handle.shutdown().await.is_err() {
            // Already dead, or between restarts.
            entry.abort.abort();
        }
        self.inner.bus.close(session);
        info!(session = %session, "session ended");
        Ok(())
    }

    /// Abort a session's actor task as if it had crashed.
    pub async fn kill(&self, session: SessionId) -> Result<(), SupervisorError> {
        let sessions = self.inner.sessions.read().await;
        let entry = sessions
            .get(&session)
            .ok_or(SupervisorError::SessionNotFound { session })?;
        warn!(session = %session, "killing simulation actor");
        entry.abort.abort();
        Ok(())
    }

    /// End every session.
    pub async fn shutdown_all(&self) {
        let ids: Vec<SessionId> = self.inner.sessions.read().await.keys().copied().collect();
        for session in ids {
            // A session may end on its own while we iterate.
            let _ = self.end_session(session).await;
        }
    }
}

/// Await one session's actor tasks, restarting them after crashes.
async fn monitor(
    inner: Arc<Inner>,
    session: SessionId,
    mut task: JoinHandle<()>,
    mut settings: watch::Receiver<SimulationSettings>,
) {
    loop {
        let result = task.await;
        let last = *settings.borrow();

        let Err(err) = result else {
            inner.sessions.write().await.remove(&session);
            inner.bus.close(session);
            info!("actor exited normally");
            return;
        };

        warn!(reason = crash_reason(&err), "actor terminated unexpectedly");
        inner.bus.close(session);

        let Some(restarts) = record_restart(&inner, session).await else {
            return;
        };

        tokio::time::sleep(inner.restart_delay).await;

        let config = ActorConfig {
            seed: inner
                .actor
                .seed
                .map(|seed| seed.wrapping_add(u64::from(restarts))),
            ..inner.actor
        };
        let spawned = spawn_actor(session, last, InitialGrid::Random, &config, inner.bus.clone());

        {
            let mut sessions = inner.sessions.write().await;
            let Some(entry) = sessions.get_mut(&session) else {
                spawned.task.abort();
                inner.bus.close(session);
                return;
            };
            entry.abort = spawned.task.abort_handle();
            entry.settings = spawned.settings.clone();
            entry.handle.send_replace(spawned.handle);
        }

        info!(
            restarts,
            rows = last.rows,
            cols = last.cols,
            tick_ms = last.tick_ms,
            "actor restarted"
        );
        task = spawned.task;
        settings = spawned.settings;
    }
}

/// Count a restart. `None` when the session is gone or out of restarts.
async fn record_restart(inner: &Inner, session: SessionId) -> Option<u32> {
    let mut sessions = inner.sessions.write().await;
    let entry = sessions.get_mut(&session)?;
    if inner.max_restarts != 0 && entry.restarts >= inner.max_restarts {
        sessions.remove(&session);
        error!(max_restarts = inner.max_restarts, "restart limit reached, dropping session");
        return None;
    }
    entry.restarts = entry.restarts.saturating_add(1);
    Some(entry.restarts)
}

fn crash_reason(err: &JoinError) -> &'static str {
    if err.is_panic() {
        "panic"
    } else if err.is_cancelled() {
        "aborted"
    } else {
        "unknown"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::actor::ActorError;

    fn supervisor(max_restarts: u32) -> SessionSupervisor {
        let mut config = LifegridConfig::default();
        config.simulation.seed = Some(1);
        config.supervisor.max_restarts = max_restarts;
        config.supervisor.restart_delay_ms = 20;
        SessionSupervisor::new(&config, SnapshotBus::new(64))
    }

    /// Drain a subscription until it reports end-of-stream.
    async fn expect_closed(rx: &mut tokio::sync::broadcast::Receiver<lifegrid_types::Snapshot>) {
        loop {
            match rx.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_session_clamps_inputs() {
        let sup = supervisor(5);
        let (_, handle) = sup.start_session(0, 1_000, 10).await;
        let snapshot = handle.get_state().await.unwrap();
        assert_eq!((snapshot.rows, snapshot.cols, snapshot.tick_ms), (5, 100, 50));
        assert_eq!(snapshot.generation, 0);
        assert!(!snapshot.running);
    }

    #[tokio::test(start_paused = true)]
    async fn killed_actor_restarts_with_last_settings() {
        let sup = supervisor(5);
        let (session, old) = sup.start_session(10, 10, 100).await;
        old.resize(12, 15).await.unwrap();
        old.set_speed(300).await.unwrap();
        old.start_running().await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;

        let mut old_rx = old.subscribe();
        let mut handles = sup.watch(session).await.unwrap();
        sup.kill(session).await.unwrap();

        expect_closed(&mut old_rx).await;
        handles.changed().await.unwrap();
        let new = handles.borrow_and_update().clone();

        let snapshot = new.get_state().await.unwrap();
        assert_eq!((snapshot.rows, snapshot.cols, snapshot.tick_ms), (12, 15, 300));
        assert_eq!(snapshot.generation, 0);
        assert!(!snapshot.running);

        assert_eq!(old.get_state().await, Err(ActorError::Unavailable));
        assert_eq!(sup.sessions().await.first().unwrap().restarts, 1);

        // The supervisor now hands out the replacement.
        let current = sup.handle(session).await.unwrap();
        assert!(current.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn new_subscription_after_restart_receives_snapshots() {
        let sup = supervisor(5);
        let (session, _) = sup.start_session(10, 10, 100).await;
        let mut handles = sup.watch(session).await.unwrap();
        sup.kill(session).await.unwrap();
        handles.changed().await.unwrap();

        let new = handles.borrow_and_update().clone();
        let mut rx = new.subscribe();
        let stepped = new.step().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), stepped);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_limit_drops_the_session() {
        let sup = supervisor(1);
        let (session, _) = sup.start_session(10, 10, 100).await;
        let mut handles = sup.watch(session).await.unwrap();

        sup.kill(session).await.unwrap();
        handles.changed().await.unwrap();

        sup.kill(session).await.unwrap();
        assert!(handles.changed().await.is_err());
        assert_eq!(
            sup.handle(session).await.unwrap_err(),
            SupervisorError::SessionNotFound { session }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn end_session_does_not_restart() {
        let sup = supervisor(0);
        let (session, handle) = sup.start_session(10, 10, 100).await;
        let mut rx = handle.subscribe();
        let mut handles = sup.watch(session).await.unwrap();

        sup.end_session(session).await.unwrap();
        expect_closed(&mut rx).await;
        assert!(handles.changed().await.is_err());
        assert!(sup.sessions().await.is_empty());
        assert!(matches!(
            sup.end_session(session).await,
            Err(SupervisorError::SessionNotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_lists_live_sessions() {
        let sup = supervisor(5);
        let (a, _) = sup.start_session(10, 10, 100).await;
        let (b, handle_b) = sup.start_session(20, 30, 400).await;
        handle_b.get_state().await.unwrap();

        let listed = sup.sessions().await;
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|s| s.id == a));
        let summary_b = listed.iter().find(|s| s.id == b).unwrap();
        assert_eq!(
            summary_b.settings,
            SimulationSettings {
                rows: 20,
                cols: 30,
                tick_ms: 400
            }
        );

        sup.shutdown_all().await;
        assert!(sup.sessions().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_session_is_reported() {
        let sup = supervisor(5);
        let missing = SessionId::new();
        assert!(sup.handle(missing).await.is_err());
        assert!(sup.watch(missing).await.is_err());
        assert!(sup.kill(missing).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn late_subscribers_of_ended_sessions_leave_no_topics() {
        let sup = supervisor(5);
        let mut stale = Vec::new();
        for _ in 0..20 {
            let (session, handle) = sup.start_session(10, 10, 100).await;
            sup.end_session(session).await.unwrap();
            stale.push(handle);
        }
        // Let every monitor observe its actor's exit.
        tokio::time::sleep(Duration::from_millis(50)).await;

        for handle in &stale {
            let mut rx = handle.subscribe();
            assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
        }
        assert_eq!(sup.bus().topic_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_reopens_the_topic() {
        let sup = supervisor(5);
        let (session, _) = sup.start_session(10, 10, 100).await;
        let mut handles = sup.watch(session).await.unwrap();
        sup.kill(session).await.unwrap();
        handles.changed().await.unwrap();

        assert_eq!(sup.bus().topic_count(), 1);
        sup.end_session(session).await.unwrap();
        assert_eq!(sup.bus().topic_count(), 0);
    }
}
