//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the [`SessionSupervisor`], which owns every live
//! session and the snapshot bus they publish to. Handlers resolve a
//! session's current actor handle per request and never cache it, so a
//! restarted actor is picked up transparently.

use lifegrid_core::actor::ActorHandle;
use lifegrid_core::bus::SnapshotBus;
use lifegrid_core::supervisor::SessionSupervisor;
use lifegrid_types::SessionId;

use crate::error::ObserverError;

/// Shared state for the Observer API server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Owner of every live session.
    pub supervisor: SessionSupervisor,
}

impl AppState {
    /// Create application state around a supervisor.
    pub const fn new(supervisor: SessionSupervisor) -> Self {
        Self { supervisor }
    }

    /// The snapshot bus sessions publish to.
    pub fn bus(&self) -> &SnapshotBus {
        self.supervisor.bus()
    }

    /// Current actor handle of a session.
    pub async fn handle(&self, session: SessionId) -> Result<ActorHandle, ObserverError> {
        Ok(self.supervisor.handle(session).await?)
    }
}
