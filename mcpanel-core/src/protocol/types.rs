//! Payload types carried inside inbound events.
//!
//! The peer is lenient about what it sends (fields go missing, numbers
//! arrive as strings), so every optional field has a serde default and
//! metric values are modelled as [`Metric`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Keys that must never reach an editable configuration view.
pub const RCON_KEYS: &[&str] = &[
    "rcon_password",
    "rcon_port",
    "enable-rcon",
    "rcon.password",
    "rcon.port",
];

// ── ServerHandle ─────────────────────────────────────────────────

/// Immutable snapshot of the server the console is attached to.
///
/// Received in `connect_success`; replaced wholesale on every reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerHandle {
    /// Server name as reported by the peer's version metadata. May be
    /// empty when the metadata has none.
    #[serde(rename = "server_name", default)]
    pub name: String,
    /// Optional human-facing name; falls back to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub game_version: String,
    #[serde(default)]
    pub platform_type: String,
    #[serde(default)]
    pub platform_version: String,
}

impl ServerHandle {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Minecraft {} {} {}",
            self.display_name(),
            self.game_version,
            self.platform_type,
            self.platform_version
        )
    }
}

// ── Process list ─────────────────────────────────────────────────

/// One running server process from a `server_list` event.
///
/// Older peers send bare names; newer ones send `{name, display_name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessEntry {
    Named { name: String, display_name: String },
    Bare(String),
}

impl ProcessEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Named { name, .. } => name,
            Self::Bare(name) => name,
        }
    }
}

/// A process entry with its display name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub name: String,
    pub display_name: String,
}

// ── Search results ───────────────────────────────────────────────

/// One installed server from a `server_search_result` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub reason: String,
    /// Version metadata for the server.
    #[serde(default)]
    pub info: BTreeMap<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl SearchEntry {
    /// The `server_name` recorded in the version metadata, if any.
    pub fn metadata_name(&self) -> Option<&str> {
        self.info.get("server_name").and_then(|v| v.as_str())
    }
}

// ── Selected server ──────────────────────────────────────────────

/// Editable configuration of the server chosen for editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerDetails {
    /// Version metadata (`version.json`).
    #[serde(default)]
    pub info: BTreeMap<String, serde_json::Value>,
    /// `server.properties` key/values.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub start_script: String,
}

impl ServerDetails {
    /// Version metadata without RCON credentials.
    pub fn editable_info(&self) -> BTreeMap<String, serde_json::Value> {
        self.info
            .iter()
            .filter(|(k, _)| !RCON_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// `server.properties` without RCON settings.
    pub fn editable_properties(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter(|(k, _)| !RCON_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ── Telemetry ────────────────────────────────────────────────────

/// A metric the peer reports either as a number or as placeholder text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Number(f64),
    Text(String),
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Text("--".into())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Number(n) => write!(f, "{n:.1}"),
            Metric::Text(s) => f.write_str(s),
        }
    }
}

/// Network throughput in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkIo {
    #[serde(default, rename = "bytes_sent")]
    pub sent: f64,
    #[serde(default, rename = "bytes_recv")]
    pub recv: f64,
}

/// Resource telemetry from one `server_status` event.
///
/// Replaced wholesale on every event; the core keeps no history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySample {
    #[serde(rename = "memory_usage")]
    pub memory_usage_percent: f64,
    pub memory_total: f64,
    #[serde(rename = "cpu_usage")]
    pub cpu_usage_percent: f64,
    #[serde(rename = "cpu_frequency")]
    pub cpu_frequency_mhz: f64,
    pub network_io: NetworkIo,
    pub tps: Metric,
    pub mspt: Metric,
    pub players_online: Metric,
    pub players_max: Metric,
    pub spark_installed: bool,
}

// ── Components ───────────────────────────────────────────────────

/// One file inside a component directory (mods, plugins, schematics...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mtime: f64,
}

/// Component listing keyed by component kind.
pub type ComponentMap = BTreeMap<String, Vec<ComponentFile>>;

// ── Helpers ──────────────────────────────────────────────────────

/// Format a byte count with 1024-based units, e.g. `1.5 KB`.
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes <= 0.0 {
        return "0 Bytes".to_string();
    }
    let exp = (bytes.ln() / 1024f64.ln()).floor().clamp(0.0, 4.0) as i32;
    let scaled = bytes / 1024f64.powi(exp);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp as usize])
}
