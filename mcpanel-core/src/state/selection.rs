//! Configuration selection: which installed server is being edited.
//!
//! Independent of the console session. The selected name is shared by the
//! configuration and component views; choosing it in one mirrors into the
//! other without any traffic. Editable configuration is only exposed after
//! the peer confirms a `select_server` request.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::PanelError;
use crate::protocol::{ComponentMap, ProcessEntry, ProcessInfo, SearchEntry, ServerDetails};

#[derive(Debug, Clone, Default)]
pub struct ConfigSelection {
    selected: Option<String>,
    /// Results of the latest search, in peer order.
    entries: Vec<SearchEntry>,
    /// Search metadata keyed by server name. Replaced on every search.
    server_info: BTreeMap<String, SearchEntry>,
    /// Name of an in-flight `select_server`.
    pending: Option<String>,
    loaded: Option<(String, ServerDetails)>,
    components: Option<(String, ComponentMap)>,
}

impl ConfigSelection {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn info(&self, name: &str) -> Option<&SearchEntry> {
        self.server_info.get(name)
    }

    /// Name of the selected server, or [`PanelError::NoServerSelected`].
    pub fn require_selected(&self) -> Result<&str, PanelError> {
        self.selected.as_deref().ok_or(PanelError::NoServerSelected)
    }

    /// Choose a server locally. The name must come from the latest search
    /// and be usable.
    pub fn select_local(&mut self, name: &str) -> Result<(), PanelError> {
        let entry = self
            .server_info
            .get(name)
            .ok_or_else(|| PanelError::Other(format!("unknown server '{name}'; search first")))?;
        if !entry.valid {
            return Err(PanelError::Other(format!(
                "server '{name}' is not usable: {}",
                entry.reason
            )));
        }
        if self.selected.as_deref() != Some(name) {
            debug!(name, "selection changed");
            self.selected = Some(name.to_string());
            self.loaded = None;
        }
        Ok(())
    }

    /// Record a `select_server` request for the selected server.
    pub fn request_select(&mut self) -> Result<String, PanelError> {
        let name = self.require_selected()?.to_string();
        self.pending = Some(name.clone());
        Ok(name)
    }

    /// The peer confirmed a selection. Returns the confirmed name.
    pub fn on_selected(&mut self, details: ServerDetails) -> Option<String> {
        let name = self.pending.take().or_else(|| self.selected.clone())?;
        self.loaded = Some((name.clone(), details));
        Some(name)
    }

    /// Configuration confirmed by the peer for the current selection.
    pub fn editable(&self) -> Option<&ServerDetails> {
        match (&self.loaded, &self.selected) {
            (Some((loaded, details)), Some(selected)) if loaded == selected => Some(details),
            _ => None,
        }
    }

    /// Replace search results wholesale. The selection survives only if the
    /// name is still present; returns whether it did.
    pub fn replace_search(&mut self, entries: Vec<SearchEntry>) -> bool {
        self.server_info = entries
            .iter()
            .map(|e| (e.name.clone(), e.clone()))
            .collect();
        self.entries = entries;

        let kept = self
            .selected
            .as_ref()
            .is_some_and(|name| self.server_info.contains_key(name));
        if !kept && self.selected.is_some() {
            debug!("selection dropped by new search results");
            self.selected = None;
            self.loaded = None;
            self.pending = None;
        }
        kept
    }

    /// Resolve display names for a `server_list`. Bare names fall back to
    /// the `server_name` in cached search metadata, then to the name.
    pub fn resolve_processes(&self, entries: &[ProcessEntry]) -> Vec<ProcessInfo> {
        entries
            .iter()
            .map(|entry| match entry {
                ProcessEntry::Named { name, display_name } => ProcessInfo {
                    name: name.clone(),
                    display_name: display_name.clone(),
                },
                ProcessEntry::Bare(name) => ProcessInfo {
                    name: name.clone(),
                    display_name: self
                        .server_info
                        .get(name)
                        .and_then(SearchEntry::metadata_name)
                        .unwrap_or(name)
                        .to_string(),
                },
            })
            .collect()
    }

    /// Store a component listing with every kind sorted by file name.
    pub fn on_components(&mut self, server_name: String, mut components: ComponentMap) -> &ComponentMap {
        for files in components.values_mut() {
            files.sort_by(|a, b| a.name.cmp(&b.name));
        }
        &self.components.insert((server_name, components)).1
    }

    pub fn components(&self) -> Option<(&str, &ComponentMap)> {
        self.components.as_ref().map(|(n, c)| (n.as_str(), c))
    }
}
