//! Outbound commands (panel → peer).
//!
//! # Wire format
//!
//! ```text
//! {"action": "<name>", ...fields}
//! ```
//!
//! One JSON object per frame, no batching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

// ── ConfigType ───────────────────────────────────────────────────

/// Which configuration document a `save_config` command replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    /// Version metadata (`version.json`).
    Version,
    /// `server.properties`.
    Properties,
    /// The launch script.
    StartScript,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Version => "version",
            ConfigType::Properties => "properties",
            ConfigType::StartScript => "start_script",
        }
    }
}

impl FromStr for ConfigType {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "version" => Ok(ConfigType::Version),
            "properties" => Ok(ConfigType::Properties),
            "start_script" => Ok(ConfigType::StartScript),
            other => Err(PanelError::Other(format!("unknown config type '{other}'"))),
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Command ──────────────────────────────────────────────────────

/// Every command the panel can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Ask for the list of running server processes.
    RefreshServers,
    /// Attach the console to a running process.
    ConnectServer { server_name: String },
    /// Run a console command on the attached server.
    ExecuteCommand { command: String },
    /// Scan installed servers.
    SearchServers,
    /// Load the configuration of an installed server.
    SelectServer { server_name: String },
    /// Replace one configuration document.
    SaveConfig {
        server_name: String,
        config_type: ConfigType,
        config_data: serde_json::Value,
    },
    /// Launch an installed server.
    StartServer { server_name: String },
    /// List mods, plugins, schematics etc.
    GetComponents { server_name: String },
    /// Delete one schematic file.
    DeleteSchematic {
        server_name: String,
        schematic_name: String,
    },
    /// Ask for an immediate `server_status`.
    RefreshStatus,
}

impl Command {
    /// The `action` discriminant as it appears on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            Command::RefreshServers => "refresh_servers",
            Command::ConnectServer { .. } => "connect_server",
            Command::ExecuteCommand { .. } => "execute_command",
            Command::SearchServers => "search_servers",
            Command::SelectServer { .. } => "select_server",
            Command::SaveConfig { .. } => "save_config",
            Command::StartServer { .. } => "start_server",
            Command::GetComponents { .. } => "get_components",
            Command::DeleteSchematic { .. } => "delete_schematic",
            Command::RefreshStatus => "refresh_status",
        }
    }

    /// Serialize to a text frame.
    pub fn to_frame(&self) -> Result<String, PanelError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}
