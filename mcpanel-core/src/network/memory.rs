//! In-memory link that records traffic instead of touching the network.
//!
//! Used by the dashboard tests and simulations; the test drives the
//! connection by feeding [`LinkEvent`](crate::network::LinkEvent)s back
//! into the dashboard by hand.

use crate::error::PanelError;
use crate::network::{Endpoint, Link};

#[derive(Debug, Default)]
pub struct MemoryLink {
    /// Every `open` call, in order.
    pub opens: Vec<(Endpoint, u64)>,
    /// Every frame handed to `send`, in order.
    pub sent: Vec<String>,
    /// Number of `close` calls.
    pub closes: usize,
}

impl MemoryLink {
    /// Generation of the latest open attempt.
    pub fn last_generation(&self) -> Option<u64> {
        self.opens.last().map(|(_, g)| *g)
    }

    /// Sent frames decoded as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|f| serde_json::from_str(f).ok())
            .collect()
    }

    /// `action` fields of every sent frame.
    pub fn sent_actions(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .filter_map(|v| v.get("action").and_then(|a| a.as_str()).map(str::to_string))
            .collect()
    }
}

impl Link for MemoryLink {
    fn open(&mut self, endpoint: &Endpoint, generation: u64) {
        self.opens.push((endpoint.clone(), generation));
    }

    fn send(&mut self, frame: String) -> Result<(), PanelError> {
        self.sent.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}
