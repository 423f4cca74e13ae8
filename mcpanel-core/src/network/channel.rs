//! Transport channel: the single duplex connection to the peer.
//!
//! The channel knows nothing about message semantics. It owns the
//! [`ChannelState`] and a generation counter; every [`LinkEvent`] is tagged
//! with the generation of the open attempt that produced it, and events
//! from superseded attempts are dropped here.
//!
//! ```text
//!  Closed ──open──► Connecting ──Opened──► Open
//!    ▲                  │                   │
//!    └───── Closed ─────┴───── Closed ──────┘
//! ```

use std::fmt;

use tracing::debug;

use crate::error::PanelError;
use crate::network::Endpoint;

// ── ChannelState ─────────────────────────────────────────────────

/// Lifecycle of the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Closed,
    Connecting,
    Open,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
        }
    }
}

// ── Link ─────────────────────────────────────────────────────────

/// What the underlying connection reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Handshake completed.
    Opened,
    /// One inbound text frame.
    Frame(String),
    /// The connection ended, or never came up.
    Closed { code: u16, reason: String },
}

/// A duplex, message-oriented connection.
///
/// `open` never blocks: the outcome is reported later as a [`LinkEvent`]
/// carrying `generation`.
pub trait Link {
    /// Start connecting to `endpoint`.
    fn open(&mut self, endpoint: &Endpoint, generation: u64);

    /// Queue one text frame on the current connection.
    fn send(&mut self, frame: String) -> Result<(), PanelError>;

    /// Tear down the current connection, if any.
    fn close(&mut self);
}

// ── TransportChannel ─────────────────────────────────────────────

/// Guards a [`Link`] with the channel state machine.
#[derive(Debug)]
pub struct TransportChannel<L> {
    link: L,
    state: ChannelState,
    generation: u64,
}

impl<L: Link> TransportChannel<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: ChannelState::Closed,
            generation: 0,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Generation of the most recent open attempt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Start an open attempt.
    ///
    /// Returns `false` without touching the link when an attempt is already
    /// in flight or the channel is open.
    pub fn open(&mut self, endpoint: &Endpoint) -> bool {
        if self.state != ChannelState::Closed {
            debug!(state = %self.state, "open ignored");
            return false;
        }
        self.generation += 1;
        self.state = ChannelState::Connecting;
        debug!(generation = self.generation, %endpoint, "opening channel");
        self.link.open(endpoint, self.generation);
        true
    }

    /// Send one frame. Fails with [`PanelError::ChannelNotOpen`] unless open.
    pub fn send(&mut self, frame: String) -> Result<(), PanelError> {
        if self.state != ChannelState::Open {
            return Err(PanelError::ChannelNotOpen);
        }
        self.link.send(frame)
    }

    /// Close the channel locally. Idempotent.
    ///
    /// The current generation is retired, so the link's own close report
    /// for it is ignored. Returns `true` if the channel was not already
    /// closed.
    pub fn close(&mut self) -> bool {
        if self.state == ChannelState::Closed {
            return false;
        }
        self.generation += 1;
        self.state = ChannelState::Closed;
        self.link.close();
        true
    }

    /// Apply a link report. Returns the event if it changed or concerns
    /// the live connection, `None` if it was stale or redundant.
    pub fn on_link_event(&mut self, generation: u64, event: LinkEvent) -> Option<LinkEvent> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale link event dropped");
            return None;
        }
        match (&event, self.state) {
            (LinkEvent::Opened, ChannelState::Connecting) => {
                self.state = ChannelState::Open;
                Some(event)
            }
            (LinkEvent::Frame(_), ChannelState::Open) => Some(event),
            (LinkEvent::Closed { .. }, ChannelState::Connecting | ChannelState::Open) => {
                self.state = ChannelState::Closed;
                Some(event)
            }
            _ => {
                debug!(state = %self.state, ?event, "link event ignored");
                None
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
