//! # mcpanel-core
//!
//! Connection and state core for the mcpanel game-server dashboard.
//!
//! This crate contains:
//! - **Protocol**: `Command` (outbound, tagged by `action`) and `Event`
//!   (inbound, tagged by `type`) JSON messages plus their payload types
//! - **Network**: `TransportChannel` over a pluggable `Link`, with the
//!   production `WsLink` (WebSocket) and the in-memory `MemoryLink`
//! - **Timer**: the `Scheduler` seam, `TokioScheduler` and `ManualScheduler`
//! - **State**: liveness monitor, reconnection policy, console session,
//!   configuration selection and telemetry
//! - **Router**: command dispatch and inbound frame routing
//! - **Dashboard**: the single event loop tying it all together
//! - **View**: `ViewEvent`s for whatever renders the dashboard
//! - **Config**: `PanelConfig` loaded from TOML
//! - **Error**: `PanelError`, a typed, `thiserror`-based error hierarchy

pub mod config;
pub mod dashboard;
pub mod error;
pub mod network;
pub mod protocol;
pub mod router;
pub mod state;
pub mod timer;
pub mod view;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use config::PanelConfig;
pub use dashboard::{Dashboard, Input, UserAction};
pub use error::PanelError;
pub use network::{
    ChannelState, Endpoint, Link, LinkEvent, MemoryLink, TransportChannel, WsLink,
};
pub use protocol::{
    Command, ComponentFile, ComponentMap, ConfigType, Event, Metric, ProcessEntry, ProcessInfo,
    SearchEntry, ServerDetails, ServerHandle, TelemetrySample, format_bytes,
};
pub use router::{Router, RouterStats};
pub use state::{
    AdvancedMetrics, ConfigSelection, ConnectionSession, FixedJitter, Jitter, LivenessMonitor,
    RandomJitter, ReconnectOutcome, ReconnectPhase, ReconnectPolicy, TelemetryState,
};
pub use timer::{ManualScheduler, PendingTimer, Scheduler, TimerId, TimerKind, TokioScheduler};
pub use view::{ChannelStatus, Notice, NoticeLevel, Observers, ViewEvent};
