//! Domain-specific error types for the panel core.
//!
//! All fallible operations return `Result<T, PanelError>`.
//! Nothing in the core panics across a component boundary; the dashboard
//! turns every error into a notice or a state transition.

use thiserror::Error;

/// The canonical error type for the panel core.
#[derive(Debug, Error)]
pub enum PanelError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// An inbound frame was not valid JSON or did not match its declared type.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Encoding of an outbound command failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A state machine was asked to perform a transition it does not allow.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),

    // ── Connection Errors ────────────────────────────────────────
    /// A frame was handed to the channel while it was not open.
    #[error("channel is not open")]
    ChannelNotOpen,

    /// The link's outbound queue was dropped.
    #[error("channel closed")]
    ChannelClosed,

    /// The IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The reconnection policy reached its attempt limit.
    #[error("reconnection attempts exhausted")]
    ReconnectExhausted,

    // ── Precondition Errors ──────────────────────────────────────
    /// A console operation needs a connected server.
    #[error("not connected to a server")]
    NotConnected,

    /// A configuration operation needs a selected server.
    #[error("no server selected")]
    NoServerSelected,

    /// A connect request is already waiting for the peer.
    #[error("a connect request is already in flight")]
    AlreadyConnecting,

    /// The console session is already attached to a server.
    #[error("already connected to {0}")]
    AlreadyConnected(String),

    /// Host or port supplied for the channel is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // ── Peer Errors ──────────────────────────────────────────────
    /// The peer reported a failure.
    #[error("peer error: {0}")]
    Peer(String),

    // ── Configuration Errors ─────────────────────────────────────
    /// The configuration file could not be parsed or written.
    #[error("config error: {0}")]
    Config(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl PanelError {
    /// Precondition failures are rejected locally before anything is sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::NoServerSelected
                | Self::AlreadyConnecting
                | Self::AlreadyConnected(_)
                | Self::InvalidEndpoint(_)
        )
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for PanelError {
    fn from(s: String) -> Self {
        PanelError::Other(s)
    }
}

impl From<&str> for PanelError {
    fn from(s: &str) -> Self {
        PanelError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for PanelError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        PanelError::ChannelClosed
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(e: serde_json::Error) -> Self {
        PanelError::Encoding(e.to_string())
    }
}

impl From<toml::de::Error> for PanelError {
    fn from(e: toml::de::Error) -> Self {
        PanelError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = PanelError::ChannelNotOpen;
        assert!(e.to_string().contains("not open"));

        let e = PanelError::AlreadyConnected("S1".into());
        assert!(e.to_string().contains("S1"));
    }

    #[test]
    fn from_string() {
        let e: PanelError = "something broke".into();
        assert!(matches!(e, PanelError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e: PanelError = io_err.into();
        assert!(matches!(e, PanelError::Connection(_)));
    }

    #[test]
    fn precondition_classification() {
        assert!(PanelError::NotConnected.is_precondition());
        assert!(PanelError::NoServerSelected.is_precondition());
        assert!(!PanelError::ChannelNotOpen.is_precondition());
        assert!(!PanelError::Peer("boom".into()).is_precondition());
    }
}
