//! Wire protocol between the panel and the management peer.
//!
//! JSON text frames over a single WebSocket. Outbound frames are
//! [`Command`]s tagged by `action`; inbound frames are [`Event`]s tagged
//! by `type`. Payload structs live in [`types`].

pub mod command;
pub mod event;
pub mod types;

pub use command::{Command, ConfigType};
pub use event::Event;
pub use types::{
    ComponentFile, ComponentMap, Metric, NetworkIo, ProcessEntry, ProcessInfo, SearchEntry,
    ServerDetails, ServerHandle, TelemetrySample, format_bytes,
};
