//! Silence detection for the transport channel.
//!
//! Armed when the channel opens and re-armed on every parsed inbound frame.
//! There is no intermediate "suspect" state: either the deadline is pending
//! or it has fired.

use std::time::Duration;

use tracing::{debug, warn};

use crate::timer::{Scheduler, TimerId, TimerKind};

#[derive(Debug)]
pub struct LivenessMonitor {
    window: Duration,
    pending: Option<TimerId>,
}

impl LivenessMonitor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Start (or restart) the silence deadline, replacing any pending one.
    pub fn arm<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
        self.pending = Some(scheduler.schedule(TimerKind::Liveness, self.window));
    }

    /// Proof of life: push the deadline out by a full window.
    pub fn on_frame<S: Scheduler>(&mut self, scheduler: &mut S) {
        debug!("liveness reset");
        self.arm(scheduler);
    }

    pub fn disarm<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    /// A liveness timer fired. Returns `true` if it was the pending
    /// deadline, meaning the channel must be forced closed.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.pending != Some(id) {
            debug!(?id, "stale liveness timer ignored");
            return false;
        }
        self.pending = None;
        warn!(window = ?self.window, "no traffic from peer within liveness window");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualScheduler;

    #[test]
    fn every_frame_replaces_the_deadline() {
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));

        mon.arm(&mut sched);
        let first = sched.pending(TimerKind::Liveness).unwrap();
        assert_eq!(first.delay, Duration::from_secs(35));

        mon.on_frame(&mut sched);
        assert_eq!(sched.pending_count(TimerKind::Liveness), 1);
        let second = sched.pending(TimerKind::Liveness).unwrap();
        assert_ne!(first.id, second.id);

        assert!(!mon.on_timer(first.id));
        assert!(mon.on_timer(second.id));
        assert!(!mon.is_armed());
    }

    #[test]
    fn fires_once() {
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));
        mon.arm(&mut sched);
        let id = sched.take(TimerKind::Liveness).unwrap();
        assert!(mon.on_timer(id));
        assert!(!mon.on_timer(id));
    }

    #[test]
    fn disarm_cancels_pending() {
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));
        mon.arm(&mut sched);
        mon.disarm(&mut sched);
        assert!(sched.pending(TimerKind::Liveness).is_none());
        assert!(!mon.is_armed());
    }
}
