use std::fmt;

use crate::error::PanelError;

/// Address of the management peer's WebSocket listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Validate and build an endpoint. Port 0 and blank hosts are rejected.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, PanelError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(PanelError::InvalidEndpoint("host is empty".into()));
        }
        if port == 0 {
            return Err(PanelError::InvalidEndpoint("port must be 1-65535".into()));
        }
        Ok(Self { host, port })
    }

    /// Parse user-entered host and port strings.
    pub fn parse(host: &str, port: &str) -> Result<Self, PanelError> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| PanelError::InvalidEndpoint(format!("invalid port '{}'", port.trim())))?;
        Self::new(host, port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `ws://host:port`
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
