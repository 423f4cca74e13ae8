//! Console session state machine.
//!
//! Tracks whether the operator's live console is attached to a running
//! server. Transitions return `Result` instead of panicking; the dashboard
//! turns rejections into notices.

use std::time::{Duration, Instant};

use crate::error::PanelError;
use crate::protocol::ServerHandle;

/// ```text
///  Disconnected ──connect──► Connecting ──connect_success──► Connected
///       ▲                        │                              │
///       └────── abort ───────────┘                              │
///       └──────────── stop / crash / terminate ─────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConnectionSession {
    #[default]
    Disconnected,

    /// `connect_server` sent, waiting for `connect_success`.
    Connecting { server_name: String },

    /// Attached. `server` is the snapshot from `connect_success`.
    Connected { server: ServerHandle, since: Instant },
}

impl std::fmt::Display for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting { server_name } => write!(f, "Connecting to {server_name}"),
            Self::Connected { server, .. } => write!(f, "Connected: {server}"),
        }
    }
}

impl ConnectionSession {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    /// Present iff connected.
    pub fn active_server(&self) -> Option<&ServerHandle> {
        match self {
            Self::Connected { server, .. } => Some(server),
            _ => None,
        }
    }

    pub fn connected_duration(&self) -> Option<Duration> {
        match self {
            Self::Connected { since, .. } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self, server_name: impl Into<String>) -> Result<(), PanelError> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting {
                    server_name: server_name.into(),
                };
                Ok(())
            }
            Self::Connecting { .. } => Err(PanelError::AlreadyConnecting),
            Self::Connected { server, .. } => Err(PanelError::AlreadyConnected(server.name.clone())),
        }
    }

    /// Valid from: `Connecting`.
    pub fn complete_connect(&mut self, mut server: ServerHandle) -> Result<(), PanelError> {
        match self {
            Self::Connecting { server_name } => {
                if server.name.is_empty() {
                    server.name = std::mem::take(server_name);
                }
                *self = Self::Connected {
                    server,
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(PanelError::InvalidTransition(
                "connect_success without a pending connect request",
            )),
        }
    }

    /// The peer reported that the attached server stopped or crashed.
    ///
    /// Valid from: `Connected`. Returns the handle that was active.
    pub fn end(&mut self) -> Result<ServerHandle, PanelError> {
        match std::mem::take(self) {
            Self::Connected { server, .. } => Ok(server),
            other => {
                *self = other;
                Err(PanelError::InvalidTransition("server ended while not connected"))
            }
        }
    }

    /// The operator detaches without stopping the remote process.
    ///
    /// Valid from: `Connected`.
    pub fn terminate(&mut self) -> Result<ServerHandle, PanelError> {
        match std::mem::take(self) {
            Self::Connected { server, .. } => Ok(server),
            other => {
                *self = other;
                Err(PanelError::NotConnected)
            }
        }
    }

    /// Drop a pending connect request (channel lost, or operator cancel).
    ///
    /// Valid from: `Connecting`. Returns the name that was pending.
    pub fn abort_connect(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Connecting { server_name } => Some(server_name),
            other => {
                *self = other;
                None
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
