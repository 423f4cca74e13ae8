//! Message router: commands out, events in.
//!
//! Outbound, a [`Command`] is serialized and handed to the transport
//! channel, but only while it is open. Inbound, a raw frame is parsed,
//! the liveness monitor is told about it, and the typed [`Event`] is
//! returned for exactly one handler. Nothing here returns a parse error to
//! the caller: malformed frames are logged and dropped.

use tracing::{debug, warn};

use crate::error::PanelError;
use crate::network::{Link, TransportChannel};
use crate::protocol::{Command, Event};
use crate::state::LivenessMonitor;
use crate::timer::Scheduler;

/// Traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Commands handed to the link.
    pub sent: u64,
    /// Commands refused because the channel was not open.
    pub refused: u64,
    /// Frames decoded into a known event.
    pub routed: u64,
    /// Valid frames with an unknown `type`.
    pub ignored: u64,
    /// Frames that failed to parse or decode.
    pub dropped: u64,
}

#[derive(Debug, Default)]
pub struct Router {
    stats: RouterStats,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Serialize `command` and send it. The link is never touched unless
    /// the channel is open.
    pub fn dispatch<L: Link>(
        &mut self,
        channel: &mut TransportChannel<L>,
        command: &Command,
    ) -> Result<(), PanelError> {
        if !channel.is_open() {
            self.stats.refused += 1;
            warn!(action = command.action(), state = %channel.state(), "command refused: channel not open");
            return Err(PanelError::ChannelNotOpen);
        }
        let frame = command.to_frame()?;
        debug!(action = command.action(), %frame, "send");
        channel.send(frame)?;
        self.stats.sent += 1;
        Ok(())
    }

    /// Parse one inbound frame.
    ///
    /// Any frame that is valid JSON resets the liveness deadline, whatever
    /// its type. Returns `None` for unknown types and malformed frames.
    pub fn route<S: Scheduler>(
        &mut self,
        raw: &str,
        liveness: &mut LivenessMonitor,
        scheduler: &mut S,
    ) -> Option<Event> {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                self.stats.dropped += 1;
                warn!("dropping unparseable frame: {e}");
                return None;
            }
        };
        liveness.on_frame(scheduler);

        match Event::from_value(value) {
            Ok(Event::Unknown) => {
                self.stats.ignored += 1;
                debug!(%raw, "ignoring frame of unknown type");
                None
            }
            Ok(event) => {
                self.stats.routed += 1;
                debug!(kind = event.kind(), "recv");
                Some(event)
            }
            Err(e) => {
                self.stats.dropped += 1;
                warn!("dropping frame: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::network::{Endpoint, LinkEvent, MemoryLink};
    use crate::timer::{ManualScheduler, TimerKind};

    fn channel(open: bool) -> TransportChannel<MemoryLink> {
        let mut ch = TransportChannel::new(MemoryLink::default());
        if open {
            ch.open(&Endpoint::new("localhost", 9001).unwrap());
            ch.on_link_event(ch.generation(), LinkEvent::Opened);
        }
        ch
    }

    #[test]
    fn dispatch_refused_when_closed() {
        let mut router = Router::new();
        let mut ch = channel(false);
        let err = router.dispatch(&mut ch, &Command::RefreshServers).unwrap_err();
        assert!(matches!(err, PanelError::ChannelNotOpen));
        assert!(ch.link().sent.is_empty());
        assert_eq!(router.stats().refused, 1);
    }

    #[test]
    fn dispatch_preserves_order() {
        let mut router = Router::new();
        let mut ch = channel(true);
        router.dispatch(&mut ch, &Command::RefreshServers).unwrap();
        router
            .dispatch(&mut ch, &Command::ConnectServer { server_name: "S1".into() })
            .unwrap();
        assert_eq!(ch.link().sent_actions(), vec!["refresh_servers", "connect_server"]);
        assert_eq!(router.stats().sent, 2);
    }

    #[test]
    fn any_parsed_frame_resets_liveness() {
        let mut router = Router::new();
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));

        assert!(router.route(r#"{"type":"totally_unknown"}"#, &mut mon, &mut sched).is_none());
        assert!(mon.is_armed());
        assert_eq!(sched.history.len(), 1);

        assert!(router.route("[1,2,3]", &mut mon, &mut sched).is_none());
        assert_eq!(sched.history.len(), 2);
        assert_eq!(sched.pending_count(TimerKind::Liveness), 1);
        assert_eq!(router.stats().ignored, 2);
    }

    #[test]
    fn malformed_frames_are_dropped_without_reset() {
        let mut router = Router::new();
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));

        assert!(router.route("{not json", &mut mon, &mut sched).is_none());
        assert!(!mon.is_armed());
        assert_eq!(router.stats().dropped, 1);
    }

    #[test]
    fn bad_body_still_counts_as_proof_of_life() {
        let mut router = Router::new();
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));

        assert!(router.route(r#"{"type":"server_log"}"#, &mut mon, &mut sched).is_none());
        assert!(mon.is_armed());
        assert_eq!(router.stats().dropped, 1);
    }

    #[test]
    fn known_event_is_routed() {
        let mut router = Router::new();
        let mut sched = ManualScheduler::new();
        let mut mon = LivenessMonitor::new(Duration::from_secs(35));
        let ev = router.route(r#"{"type":"heartbeat"}"#, &mut mon, &mut sched);
        assert_eq!(ev, Some(Event::Heartbeat));
        assert_eq!(router.stats().routed, 1);
    }
}
