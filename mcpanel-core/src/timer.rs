//! Timer scheduling seam.
//!
//! Components never sleep. They ask a [`Scheduler`] for a deadline and get
//! a [`TimerId`] back; when the deadline passes the dashboard receives
//! `Input::Timer { kind, id }` and hands it to the owning component, which
//! ignores ids it is no longer waiting for.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dashboard::Input;

/// Which component a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Liveness,
    Reconnect,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liveness => write!(f, "liveness"),
            Self::Reconnect => write!(f, "reconnect"),
        }
    }
}

/// Opaque handle for one scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

pub trait Scheduler {
    /// Schedule a firing of `kind` after `delay`.
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerId;

    /// Cancel a pending timer. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

// ── TokioScheduler ───────────────────────────────────────────────

/// Spawns one sleeping task per timer that posts back to the input queue.
#[derive(Debug)]
pub struct TokioScheduler {
    inputs: mpsc::UnboundedSender<Input>,
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(inputs: mpsc::UnboundedSender<Input>) -> Self {
        Self {
            inputs,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerId {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let inputs = self.inputs.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inputs.send(Input::Timer { kind, id });
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

// ── ManualScheduler ──────────────────────────────────────────────

/// A scheduled entry in a [`ManualScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub kind: TimerKind,
    pub delay: Duration,
}

/// Scheduler that never fires on its own. Tests inspect what is pending
/// and fire timers explicitly.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<PendingTimer>,
    /// Every delay ever scheduled, in order, per kind.
    pub history: Vec<PendingTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pending timer of `kind`, if any.
    pub fn pending(&self, kind: TimerKind) -> Option<PendingTimer> {
        self.pending.iter().rev().find(|t| t.kind == kind).copied()
    }

    /// Number of pending timers of `kind`.
    pub fn pending_count(&self, kind: TimerKind) -> usize {
        self.pending.iter().filter(|t| t.kind == kind).count()
    }

    /// Remove the pending timer of `kind` so the caller can deliver it.
    pub fn take(&mut self, kind: TimerKind) -> Option<TimerId> {
        let pos = self.pending.iter().rposition(|t| t.kind == kind)?;
        Some(self.pending.remove(pos).id)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerId {
        self.next_id += 1;
        let timer = PendingTimer {
            id: TimerId(self.next_id),
            kind,
            delay,
        };
        self.pending.push(timer);
        self.history.push(timer);
        timer.id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|t| t.id != id);
    }
}
