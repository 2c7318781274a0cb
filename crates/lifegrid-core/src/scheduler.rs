//! Delayed, one-shot tick wakes for a simulation actor.
//!
//! A [`TickScheduler`] arms exactly one wake per call. There is no periodic
//! primitive: a running actor re-arms after every tick. Cancellation is
//! best-effort, so a wake may still arrive after [`TickScheduler::cancel`].
//! Each wake carries its [`TimerId`] and the actor discards any wake that
//! does not match the timer it currently holds.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::command::{Command, Message};

/// Identifier of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl core::fmt::Display for TimerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to an armed timer, consumed by [`TickScheduler::cancel`].
#[derive(Debug)]
pub struct TickHandle {
    id: TimerId,
    abort: Option<AbortHandle>,
}

impl TickHandle {
    /// A handle with nothing to abort.
    pub const fn detached(id: TimerId) -> Self {
        Self { id, abort: None }
    }

    /// A handle backed by a spawned task.
    pub const fn with_task(id: TimerId, abort: AbortHandle) -> Self {
        Self {
            id,
            abort: Some(abort),
        }
    }

    /// Id the wake will carry.
    pub const fn id(&self) -> TimerId {
        self.id
    }
}

/// Source of delayed tick wakes.
pub trait TickScheduler: Send {
    /// Arm a single wake after `delay`.
    fn schedule(&mut self, delay: Duration) -> TickHandle;

    /// Try to suppress a wake. The wake may already be in flight.
    fn cancel(&mut self, handle: TickHandle);
}

/// Production scheduler: one sleeping Tokio task per armed timer.
///
/// The task holds only a weak sender to the actor inbox, so a pending
/// timer never keeps a terminated actor alive.
#[derive(Debug)]
pub struct TokioTickScheduler {
    inbox: mpsc::WeakSender<Message>,
    next_id: u64,
}

impl TokioTickScheduler {
    /// Scheduler posting wakes into the given inbox.
    pub(crate) const fn new(inbox: mpsc::WeakSender<Message>) -> Self {
        Self { inbox, next_id: 1 }
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&mut self, delay: Duration) -> TickHandle {
        let id = TimerId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let inbox = self.inbox.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inbox) = inbox.upgrade() else {
                return;
            };
            let wake = Message::Command {
                command: Command::Tick(id),
                reply: None,
            };
            if inbox.send(wake).await.is_err() {
                tracing::trace!(timer = %id, "actor gone before tick was delivered");
            }
        });

        TickHandle::with_task(id, task.abort_handle())
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(abort) = handle.abort {
            abort.abort();
        }
    }
}

/// Scheduler that never fires on its own.
///
/// Used to drive the state machine deterministically: the caller decides
/// when a pending timer fires via [`ManualTickScheduler::fire_next`].
#[derive(Debug, Default)]
pub struct ManualTickScheduler {
    next_id: u64,
    pending: BTreeMap<TimerId, Duration>,
    cancelled: Vec<TimerId>,
}

impl ManualTickScheduler {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the oldest pending timer and return its id, as if it fired.
    pub fn fire_next(&mut self) -> Option<TimerId> {
        self.pending.pop_first().map(|(id, _)| id)
    }

    /// Number of armed timers.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Delay of a pending timer.
    pub fn pending_delay(&self, id: TimerId) -> Option<Duration> {
        self.pending.get(&id).copied()
    }

    /// Every id passed to [`TickScheduler::cancel`], in call order.
    pub fn cancelled(&self) -> &[TimerId] {
        &self.cancelled
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule(&mut self, delay: Duration) -> TickHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let id = TimerId::new(self.next_id);
        self.pending.insert(id, delay);
        TickHandle::detached(id)
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.pending.remove(&handle.id());
        self.cancelled.push(handle.id());
    }
}
