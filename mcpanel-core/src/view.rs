//! What the core tells the presentation layer.
//!
//! Subscribers receive [`ViewEvent`]s over unbounded channels. The core
//! never waits on a subscriber and drops the ones that hang up.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::protocol::{ComponentMap, ProcessInfo, SearchEntry, ServerDetails, TelemetrySample};
use crate::state::{AdvancedMetrics, ConnectionSession};

/// Channel indicator shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Online,
    Offline,
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnection exhausted. Only a manual reconfigure leaves this.
    GaveUp,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
            Self::Reconnecting { attempt, delay } => {
                write!(f, "reconnecting (attempt {attempt}, in {}s)", delay.as_secs_f64().round())
            }
            Self::GaveUp => write!(f, "offline: gave up reconnecting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ChannelStatus(ChannelStatus),
    Notice(Notice),
    /// Running processes, in the order the peer listed them.
    ProcessList(Vec<ProcessInfo>),
    Session(ConnectionSession),
    ConsoleLine(String),
    ConsoleCleared,
    Telemetry {
        sample: TelemetrySample,
        advanced: AdvancedMetrics,
    },
    /// Advanced metrics changed without a new sample (session ended).
    AdvancedMetrics(AdvancedMetrics),
    SearchResults(Vec<SearchEntry>),
    /// Shared selection for the configuration and component views.
    Selection(Option<String>),
    /// Confirmed configuration, RCON keys already removed.
    ConfigLoaded {
        server_name: String,
        details: ServerDetails,
    },
    Components {
        server_name: String,
        components: ComponentMap,
    },
}

/// Subscriber list.
#[derive(Debug, Default)]
pub struct Observers {
    subscribers: Vec<mpsc::UnboundedSender<ViewEvent>>,
}

impl Observers {
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ViewEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn notify(&mut self, event: ViewEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_gets_every_event() {
        let mut obs = Observers::default();
        let mut a = obs.subscribe();
        let mut b = obs.subscribe();
        obs.notify(ViewEvent::ConsoleCleared);
        assert_eq!(a.try_recv().unwrap(), ViewEvent::ConsoleCleared);
        assert_eq!(b.try_recv().unwrap(), ViewEvent::ConsoleCleared);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut obs = Observers::default();
        let rx = obs.subscribe();
        let _keep = obs.subscribe();
        drop(rx);
        obs.notify(ViewEvent::ConsoleCleared);
        assert_eq!(obs.len(), 1);
    }

    #[test]
    fn status_display_distinguishes_gave_up() {
        let r = ChannelStatus::Reconnecting {
            attempt: 2,
            delay: Duration::from_millis(2300),
        };
        assert_eq!(r.to_string(), "reconnecting (attempt 2, in 2s)");
        assert_ne!(ChannelStatus::GaveUp.to_string(), ChannelStatus::Offline.to_string());
    }

    #[test]
    fn notice_display() {
        assert_eq!(Notice::error("boom").to_string(), "[error] boom");
    }
}
