//! Inbound events (peer → panel).
//!
//! # Wire format
//!
//! ```text
//! {"type": "<name>", ...fields}
//! ```
//!
//! Decoding happens in two steps: the frame must first be valid JSON
//! (that alone counts as proof of life), then it is decoded against the
//! `type` discriminant. Unknown discriminants decode to
//! [`Event::Unknown`] so newer peers do not break older panels.

use serde::Deserialize;

use crate::error::PanelError;
use crate::protocol::types::{
    ComponentMap, ProcessEntry, SearchEntry, ServerDetails, ServerHandle, TelemetrySample,
};

/// Every event the panel understands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Keep-alive sent by the peer every 30 seconds.
    Heartbeat,
    /// Running server processes.
    ServerList { servers: Vec<ProcessEntry> },
    /// The console is attached to `server`.
    ConnectSuccess { server: ServerHandle },
    /// Resource telemetry for the attached server.
    ServerStatus {
        system_info: TelemetrySample,
        #[serde(default)]
        platform_type: String,
    },
    /// One line of server log output.
    ServerLog { log: String },
    /// Output of an `execute_command`.
    CommandResult { result: String },
    /// The attached server stopped.
    ServerStopped {
        #[serde(default)]
        server_name: String,
    },
    /// The attached server died unexpectedly.
    ServerCrashed {
        #[serde(default)]
        server_name: String,
    },
    /// A `start_server` completed.
    ServerStarted {
        #[serde(default)]
        server_name: String,
    },
    /// Installed servers found by `search_servers`.
    ServerSearchResult { servers: Vec<SearchEntry> },
    /// Configuration of the server chosen with `select_server`.
    ServerSelected { server: ServerDetails },
    /// Outcome of `save_config`.
    ConfigSaved { success: bool },
    /// Component listing for one server.
    ComponentsData {
        server_name: String,
        components: ComponentMap,
    },
    /// Outcome of `delete_schematic`.
    SchematicDeleted {
        success: bool,
        #[serde(default)]
        schematic_name: String,
    },
    /// The peer wants the process list refreshed.
    RefreshServers,
    /// The peer reported a failure.
    Error { message: String },
    /// Any discriminant this panel does not know about.
    #[serde(other)]
    Unknown,
}

impl Event {
    /// Decode an already-parsed JSON value.
    ///
    /// Values that are not objects, or have no string `type`, are
    /// [`Event::Unknown`]. A known `type` with a bad body is an error.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PanelError> {
        let has_tag = value
            .as_object()
            .and_then(|obj| obj.get("type"))
            .is_some_and(|t| t.is_string());
        if !has_tag {
            return Ok(Event::Unknown);
        }
        serde_json::from_value(value).map_err(|e| PanelError::MalformedFrame(e.to_string()))
    }

    /// Discriminant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Heartbeat => "heartbeat",
            Event::ServerList { .. } => "server_list",
            Event::ConnectSuccess { .. } => "connect_success",
            Event::ServerStatus { .. } => "server_status",
            Event::ServerLog { .. } => "server_log",
            Event::CommandResult { .. } => "command_result",
            Event::ServerStopped { .. } => "server_stopped",
            Event::ServerCrashed { .. } => "server_crashed",
            Event::ServerStarted { .. } => "server_started",
            Event::ServerSearchResult { .. } => "server_search_result",
            Event::ServerSelected { .. } => "server_selected",
            Event::ConfigSaved { .. } => "config_saved",
            Event::ComponentsData { .. } => "components_data",
            Event::SchematicDeleted { .. } => "schematic_deleted",
            Event::RefreshServers => "refresh_servers",
            Event::Error { .. } => "error",
            Event::Unknown => "unknown",
        }
    }
}
