//! Panel configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;
use crate::network::Endpoint;

/// Top-level configuration for the panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Where the management peer lives.
    pub network: NetworkConfig,
    /// Silence detection.
    pub liveness: LivenessConfig,
    /// Backoff between reconnection attempts.
    pub reconnect: ReconnectConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Peer host name or IP.
    pub host: String,
    /// Peer WebSocket port.
    pub port: u16,
    /// Handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

/// Liveness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Maximum tolerated silence before the channel is declared dead.
    pub window_ms: u64,
    /// Cadence at which the peer sends heartbeats. Informational; the
    /// window must stay longer than this.
    pub peer_heartbeat_ms: u64,
}

/// Reconnection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay before the first attempt.
    pub base_delay_ms: u64,
    /// Upper bound for the doubled delay.
    pub cap_ms: u64,
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter_ms: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 9001,
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            window_ms: 35_000,
            peer_heartbeat_ms: 30_000,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            cap_ms: 30_000,
            max_attempts: 10,
            max_jitter_ms: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Accessors ────────────────────────────────────────────────────

impl NetworkConfig {
    /// Validated endpoint built from host and port.
    pub fn endpoint(&self) -> Result<Endpoint, PanelError> {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl LivenessConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl PanelConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parse a TOML document.
    pub fn parse(text: &str) -> Result<Self, PanelError> {
        Ok(toml::from_str(text)?)
    }

    /// Render the default config as TOML.
    pub fn default_toml() -> Result<String, PanelError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| PanelError::Config(e.to_string()))
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> Result<(), PanelError> {
        let text = Self::default_toml()?;
        std::fs::write(path, text)
            .map_err(|e| PanelError::Config(format!("{}: {e}", path.display())))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = PanelConfig::default_toml().unwrap();
        assert!(text.contains("port = 9001"));
        assert!(text.contains("window_ms"));
        assert!(text.contains("max_attempts"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg = PanelConfig::parse("[network]\nhost = \"10.0.0.5\"\n").unwrap();
        assert_eq!(cfg.network.host, "10.0.0.5");
        assert_eq!(cfg.network.port, 9001);
        assert_eq!(cfg.reconnect.cap_ms, 30_000);
        assert_eq!(cfg.liveness.window(), Duration::from_secs(35));
    }

    #[test]
    fn window_outlasts_peer_heartbeat() {
        let cfg = LivenessConfig::default();
        assert!(cfg.window_ms > cfg.peer_heartbeat_ms);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = PanelConfig::parse("network = 3").unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }

    #[test]
    fn write_default_failure_is_config_error() {
        let err = PanelConfig::write_default(Path::new("/nonexistent/dir/mcpanel.toml")).unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = PanelConfig::load(Path::new("/nonexistent/mcpanel.toml"));
        assert_eq!(cfg.network.host, "localhost");
    }

    #[test]
    fn endpoint_from_network_config() {
        let ep = NetworkConfig::default().endpoint().unwrap();
        assert_eq!(ep.url(), "ws://localhost:9001");
    }
}
