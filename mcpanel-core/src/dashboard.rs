//! Dashboard: the single event loop that owns every piece of state.
//!
//! Three sources feed one queue of [`Input`]s: the link (open, frame,
//! close), timers (liveness deadline, reconnect delay) and the operator.
//! [`Dashboard::handle`] processes one input to completion before the next,
//! so no state is ever shared between tasks and nothing needs a lock.
//! Everything the operator should see goes out through [`ViewEvent`]s.

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::network::{ChannelState, Endpoint, Link, LinkEvent, TransportChannel, WsLink};
use crate::protocol::{Command, ConfigType, Event, ProcessInfo, ServerDetails, ServerHandle};
use crate::router::{Router, RouterStats};
use crate::state::{
    ConfigSelection, ConnectionSession, Jitter, LivenessMonitor,
    ReconnectOutcome, ReconnectPolicy, TelemetryState,
};
use crate::timer::{Scheduler, TimerId, TimerKind, TokioScheduler};
use crate::view::{ChannelStatus, Notice, Observers, ViewEvent};

/// Console lines kept before the oldest are discarded.
const CONSOLE_HISTORY: usize = 1000;

/// One unit of work for the event loop.
#[derive(Debug)]
pub enum Input {
    Link { generation: u64, event: LinkEvent },
    Timer { kind: TimerKind, id: TimerId },
    User(UserAction),
    Shutdown,
}

/// Something the operator asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    RefreshServers,
    /// Attach the console to a running process.
    Connect { server_name: String },
    Execute { command: String },
    /// Detach the console. The remote process keeps running.
    Terminate,
    SearchServers,
    /// Change the shared selection without contacting the peer.
    Select { server_name: String },
    /// Load the configuration of `server_name`, or of the current selection.
    LoadConfig { server_name: Option<String> },
    StartServer,
    SaveConfig {
        config_type: ConfigType,
        data: serde_json::Value,
    },
    GetComponents { server_name: Option<String> },
    DeleteSchematic { schematic_name: String },
    RefreshStatus,
    /// Point the channel at a new peer address.
    Reconfigure { host: String, port: String },
}

pub struct Dashboard<L: Link, S: Scheduler> {
    endpoint: Endpoint,
    channel: TransportChannel<L>,
    scheduler: S,
    liveness: LivenessMonitor,
    reconnect: ReconnectPolicy,
    router: Router,
    session: ConnectionSession,
    selection: ConfigSelection,
    telemetry: TelemetryState,
    processes: Vec<ProcessInfo>,
    console: VecDeque<String>,
    status: ChannelStatus,
    observers: Observers,
}

impl Dashboard<WsLink, TokioScheduler> {
    /// Dashboard over a real WebSocket. `inputs` must feed the queue later
    /// passed to [`Dashboard::run`].
    pub fn websocket(
        config: &PanelConfig,
        inputs: mpsc::UnboundedSender<Input>,
    ) -> Result<Self, PanelError> {
        let link = WsLink::new(inputs.clone(), config.network.connect_timeout());
        let scheduler = TokioScheduler::new(inputs);
        Self::new(config, link, scheduler)
    }
}

impl<L: Link, S: Scheduler> Dashboard<L, S> {
    pub fn new(config: &PanelConfig, link: L, scheduler: S) -> Result<Self, PanelError> {
        Ok(Self {
            endpoint: config.network.endpoint()?,
            channel: TransportChannel::new(link),
            scheduler,
            liveness: LivenessMonitor::new(config.liveness.window()),
            reconnect: ReconnectPolicy::from_config(&config.reconnect),
            router: Router::new(),
            session: ConnectionSession::default(),
            selection: ConfigSelection::default(),
            telemetry: TelemetryState::default(),
            processes: Vec::new(),
            console: VecDeque::new(),
            status: ChannelStatus::Offline,
            observers: Observers::default(),
        })
    }

    /// Replace the reconnection jitter source.
    pub fn with_jitter(mut self, jitter: impl Jitter + 'static) -> Self {
        self.reconnect.set_jitter(Box::new(jitter));
        self
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ViewEvent> {
        self.observers.subscribe()
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Generation of the latest open attempt; link events must carry it.
    pub fn generation(&self) -> u64 {
        self.channel.generation()
    }

    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    pub fn selection(&self) -> &ConfigSelection {
        &self.selection
    }

    pub fn telemetry(&self) -> &TelemetryState {
        &self.telemetry
    }

    pub fn processes(&self) -> &[ProcessInfo] {
        &self.processes
    }

    pub fn console(&self) -> impl Iterator<Item = &str> {
        self.console.iter().map(String::as_str)
    }

    pub fn reconnect(&self) -> &ReconnectPolicy {
        &self.reconnect
    }

    pub fn liveness(&self) -> &LivenessMonitor {
        &self.liveness
    }

    pub fn router_stats(&self) -> RouterStats {
        self.router.stats()
    }

    pub fn link(&self) -> &L {
        self.channel.link()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // ── Event loop ───────────────────────────────────────────────

    /// Open the channel to the configured endpoint.
    pub fn start(&mut self) {
        info!(endpoint = %self.endpoint, "starting dashboard");
        self.open_channel();
    }

    /// Drive the dashboard until [`Input::Shutdown`] or the queue closes.
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) {
        self.start();
        while let Some(input) = inputs.recv().await {
            if !self.handle(input) {
                return;
            }
        }
        self.shutdown();
    }

    /// Process one input. Returns `false` once shut down.
    pub fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::Link { generation, event } => self.on_link(generation, event),
            Input::Timer { kind, id } => self.on_timer(kind, id),
            Input::User(action) => {
                debug!(?action, "user action");
                if let Err(e) = self.on_user(action) {
                    self.reject(e);
                }
            }
            Input::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    fn shutdown(&mut self) {
        info!("dashboard shutting down");
        self.liveness.disarm(&mut self.scheduler);
        self.reconnect.reset(&mut self.scheduler);
        self.channel.close();
    }

    // ── Channel lifecycle ────────────────────────────────────────

    fn open_channel(&mut self) {
        if self.channel.open(&self.endpoint) {
            self.set_status(ChannelStatus::Connecting);
        }
    }

    fn on_link(&mut self, generation: u64, event: LinkEvent) {
        let Some(event) = self.channel.on_link_event(generation, event) else {
            return;
        };
        match event {
            LinkEvent::Opened => {
                info!(endpoint = %self.endpoint, "channel open");
                self.reconnect.on_open();
                self.liveness.arm(&mut self.scheduler);
                self.set_status(ChannelStatus::Online);
            }
            LinkEvent::Frame(raw) => {
                if let Some(event) =
                    self.router
                        .route(&raw, &mut self.liveness, &mut self.scheduler)
                {
                    self.on_event(event);
                }
            }
            LinkEvent::Closed { code, reason } => {
                info!(code, %reason, "channel closed");
                self.on_channel_lost();
            }
        }
    }

    fn on_timer(&mut self, kind: TimerKind, id: TimerId) {
        match kind {
            TimerKind::Liveness => {
                if self.liveness.on_timer(id) {
                    // Retires the generation, so the link's own close
                    // report will not start a second cycle.
                    self.channel.close();
                    self.on_channel_lost();
                }
            }
            TimerKind::Reconnect => {
                if self.reconnect.on_timer(id) {
                    info!(attempt = self.reconnect.attempt_count(), "reconnecting");
                    self.open_channel();
                }
            }
        }
    }

    fn on_channel_lost(&mut self) {
        self.liveness.disarm(&mut self.scheduler);
        if let Some(name) = self.session.abort_connect() {
            self.notify(ViewEvent::Session(self.session.clone()));
            self.notice(Notice::error(format!("connect to {name} aborted: channel closed")));
        }
        self.set_status(ChannelStatus::Offline);

        match self.reconnect.on_close(&mut self.scheduler) {
            ReconnectOutcome::Scheduled { attempt, delay } => {
                self.set_status(ChannelStatus::Reconnecting { attempt, delay });
            }
            ReconnectOutcome::GaveUp => {
                error!(endpoint = %self.endpoint, "{}", PanelError::ReconnectExhausted);
                self.set_status(ChannelStatus::GaveUp);
            }
        }
    }

    // ── Operator actions ─────────────────────────────────────────

    fn on_user(&mut self, action: UserAction) -> Result<(), PanelError> {
        match action {
            UserAction::RefreshServers => {
                self.send(Command::RefreshServers)?;
                self.notice(Notice::info("refreshing server list"));
            }
            UserAction::Connect { server_name } => self.connect(server_name)?,
            UserAction::Execute { command } => self.execute(command)?,
            UserAction::Terminate => self.terminate()?,
            UserAction::SearchServers => {
                self.send(Command::SearchServers)?;
                self.notice(Notice::info("searching for servers"));
            }
            UserAction::Select { server_name } => self.select_local(&server_name)?,
            UserAction::LoadConfig { server_name } => {
                if let Some(name) = server_name {
                    self.select_local(&name)?;
                }
                let server_name = self.selection.require_selected()?.to_string();
                self.send(Command::SelectServer {
                    server_name: server_name.clone(),
                })?;
                self.selection.request_select()?;
                self.notice(Notice::info(format!("loading configuration of {server_name}")));
            }
            UserAction::StartServer => {
                let server_name = self.selection.require_selected()?.to_string();
                self.send(Command::StartServer {
                    server_name: server_name.clone(),
                })?;
                self.notice(Notice::info(format!("starting {server_name}")));
            }
            UserAction::SaveConfig { config_type, data } => {
                let server_name = self.selection.require_selected()?.to_string();
                self.send(Command::SaveConfig {
                    server_name,
                    config_type,
                    config_data: data,
                })?;
            }
            UserAction::GetComponents { server_name } => {
                if let Some(name) = server_name {
                    self.select_local(&name)?;
                }
                self.request_components()?;
            }
            UserAction::DeleteSchematic { schematic_name } => {
                let server_name = self.selection.require_selected()?.to_string();
                self.send(Command::DeleteSchematic {
                    server_name,
                    schematic_name,
                })?;
            }
            UserAction::RefreshStatus => {
                if !self.session.is_connected() {
                    return Err(PanelError::NotConnected);
                }
                self.send(Command::RefreshStatus)?;
            }
            UserAction::Reconfigure { host, port } => self.reconfigure(&host, &port)?,
        }
        Ok(())
    }

    fn connect(&mut self, server_name: String) -> Result<(), PanelError> {
        let server_name = server_name.trim().to_string();
        if server_name.is_empty() {
            return Err(PanelError::Other("choose a server process first".into()));
        }
        if self.session.is_connecting() {
            debug!(server = %server_name, "connect already pending");
            return Ok(());
        }
        self.session.begin_connect(server_name.clone())?;
        if let Err(e) = self.send(Command::ConnectServer {
            server_name: server_name.clone(),
        }) {
            self.session.abort_connect();
            return Err(e);
        }
        self.notify(ViewEvent::Session(self.session.clone()));
        self.notice(Notice::info(format!("connecting to {server_name}")));
        Ok(())
    }

    fn execute(&mut self, command: String) -> Result<(), PanelError> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(());
        }
        if !self.session.is_connected() {
            return Err(PanelError::NotConnected);
        }
        self.send(Command::ExecuteCommand {
            command: command.to_string(),
        })?;
        self.push_console(format!("> {command}"));
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), PanelError> {
        if let Some(name) = self.session.abort_connect() {
            self.notify(ViewEvent::Session(self.session.clone()));
            self.notice(Notice::info(format!("connect to {name} cancelled")));
            return Ok(());
        }
        let server = self.session.terminate()?;
        self.session_ended();
        self.notice(Notice::info(format!("detached from {}", server.name)));
        Ok(())
    }

    fn select_local(&mut self, server_name: &str) -> Result<(), PanelError> {
        self.selection.select_local(server_name)?;
        self.notify(ViewEvent::Selection(Some(server_name.to_string())));
        Ok(())
    }

    fn request_components(&mut self) -> Result<(), PanelError> {
        let server_name = self.selection.require_selected()?.to_string();
        self.send(Command::GetComponents {
            server_name: server_name.clone(),
        })?;
        self.notice(Notice::info(format!("fetching components of {server_name}")));
        Ok(())
    }

    fn reconfigure(&mut self, host: &str, port: &str) -> Result<(), PanelError> {
        let endpoint = Endpoint::parse(host, port)?;
        info!(from = %self.endpoint, to = %endpoint, "reconfiguring channel");

        self.channel.close();
        self.liveness.disarm(&mut self.scheduler);
        self.reconnect.reset(&mut self.scheduler);
        if self.session.abort_connect().is_some() {
            self.notify(ViewEvent::Session(self.session.clone()));
        }

        self.endpoint = endpoint;
        self.notice(Notice::info(format!("connecting to {}", self.endpoint)));
        self.set_status(ChannelStatus::Offline);
        self.open_channel();
        Ok(())
    }

    // ── Peer events ──────────────────────────────────────────────

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Heartbeat => {}
            Event::ServerList { servers } => {
                self.processes = self.selection.resolve_processes(&servers);
                self.notify(ViewEvent::ProcessList(self.processes.clone()));
                self.notice(Notice::success("server list refreshed"));
            }
            Event::ConnectSuccess { server } => self.on_connect_success(server),
            Event::ServerStatus {
                system_info,
                platform_type,
            } => {
                let advanced = self.telemetry.update(
                    system_info.clone(),
                    platform_type,
                    self.session.is_connected(),
                );
                self.notify(ViewEvent::Telemetry {
                    sample: system_info,
                    advanced,
                });
            }
            Event::ServerLog { log } => self.push_console(log),
            Event::CommandResult { result } => self.push_console(result),
            Event::ServerStopped { server_name } => self.on_server_ended(server_name, false),
            Event::ServerCrashed { server_name } => self.on_server_ended(server_name, true),
            Event::ServerStarted { server_name } => {
                self.notice(Notice::success(format!("server {server_name} started")));
            }
            Event::ServerSearchResult { servers } => {
                let kept = self.selection.replace_search(servers);
                self.notify(ViewEvent::SearchResults(self.selection.entries().to_vec()));
                if !kept {
                    self.notify(ViewEvent::Selection(None));
                }
                self.notice(Notice::success("server search complete"));
            }
            Event::ServerSelected { server } => {
                let details = ServerDetails {
                    info: server.editable_info(),
                    properties: server.editable_properties(),
                    start_script: server.start_script.clone(),
                };
                match self.selection.on_selected(server) {
                    Some(server_name) => {
                        self.notify(ViewEvent::ConfigLoaded {
                            server_name,
                            details,
                        });
                        self.notice(Notice::success("configuration loaded"));
                    }
                    None => warn!("server_selected with no selection"),
                }
            }
            Event::ConfigSaved { success } => {
                if success {
                    self.notice(Notice::success("configuration saved"));
                } else {
                    self.notice(Notice::error("failed to save configuration"));
                }
            }
            Event::ComponentsData {
                server_name,
                components,
            } => {
                let components = self
                    .selection
                    .on_components(server_name.clone(), components)
                    .clone();
                self.notify(ViewEvent::Components {
                    server_name: server_name.clone(),
                    components,
                });
                self.notice(Notice::success(format!("loaded components of {server_name}")));
            }
            Event::SchematicDeleted {
                success,
                schematic_name,
            } => {
                if success {
                    self.notice(Notice::success(format!("deleted schematic {schematic_name}")));
                    if let Err(e) = self.request_components() {
                        self.reject(e);
                    }
                } else {
                    self.notice(Notice::error(format!(
                        "failed to delete schematic {schematic_name}"
                    )));
                }
            }
            Event::RefreshServers => {
                if let Err(e) = self.send(Command::RefreshServers) {
                    self.reject(e);
                }
                self.notice(Notice::info("server list updated"));
            }
            Event::Error { message } => {
                warn!(%message, "peer error");
                self.notice(Notice::error(PanelError::Peer(message).to_string()));
            }
            Event::Unknown => {}
        }
    }

    fn on_connect_success(&mut self, server: ServerHandle) {
        if let Err(e) = self.session.complete_connect(server) {
            warn!("{e}");
            return;
        }
        let name = self
            .session
            .active_server()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        info!(server = %name, "console attached");
        self.clear_console();
        self.notify(ViewEvent::Session(self.session.clone()));
        let advanced = self.telemetry.advanced(true);
        self.notify(ViewEvent::AdvancedMetrics(advanced));
        self.notice(Notice::success(format!("connected to {name}")));
    }

    fn on_server_ended(&mut self, server_name: String, crashed: bool) {
        match self.session.end() {
            Ok(server) => {
                info!(server = %server.name, crashed, "console detached by peer");
                if crashed {
                    self.notice(Notice::error(format!(
                        "server {server_name} stopped unexpectedly"
                    )));
                }
                self.session_ended();
                if !crashed {
                    self.notice(Notice::info(format!("connection to {server_name} ended")));
                }
            }
            Err(e) => debug!(server = %server_name, "{e}"),
        }
    }

    /// Local cleanup shared by stop, crash and terminate.
    fn session_ended(&mut self) {
        self.clear_console();
        self.notify(ViewEvent::Session(self.session.clone()));
        let advanced = self.telemetry.advanced(false);
        self.notify(ViewEvent::AdvancedMetrics(advanced));
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn send(&mut self, command: Command) -> Result<(), PanelError> {
        self.router.dispatch(&mut self.channel, &command)
    }

    fn reject(&mut self, error: PanelError) {
        if error.is_precondition() {
            debug!("rejected: {error}");
        } else {
            warn!("rejected: {error}");
        }
        self.notice(Notice::error(error.to_string()));
    }

    fn push_console(&mut self, line: String) {
        if self.console.len() == CONSOLE_HISTORY {
            self.console.pop_front();
        }
        self.console.push_back(line.clone());
        self.notify(ViewEvent::ConsoleLine(line));
    }

    fn clear_console(&mut self) {
        self.console.clear();
        self.notify(ViewEvent::ConsoleCleared);
    }

    fn set_status(&mut self, status: ChannelStatus) {
        if self.status != status {
            self.status = status;
            self.notify(ViewEvent::ChannelStatus(status));
        }
    }

    fn notice(&mut self, notice: Notice) {
        self.notify(ViewEvent::Notice(notice));
    }

    fn notify(&mut self, event: ViewEvent) {
        self.observers.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MemoryLink;
    use crate::state::FixedJitter;
    use crate::timer::ManualScheduler;
    use std::time::Duration;

    type TestDashboard = Dashboard<MemoryLink, ManualScheduler>;

    fn online() -> TestDashboard {
        let mut d = Dashboard::new(&PanelConfig::default(), MemoryLink::default(), ManualScheduler::new())
            .unwrap()
            .with_jitter(FixedJitter(Duration::ZERO));
        d.start();
        let generation = d.generation();
        d.handle(Input::Link {
            generation,
            event: LinkEvent::Opened,
        });
        d
    }

    fn frame(d: &mut TestDashboard, json: &str) {
        let generation = d.generation();
        d.handle(Input::Link {
            generation,
            event: LinkEvent::Frame(json.to_string()),
        });
    }

    #[test]
    fn opened_arms_liveness_and_goes_online() {
        let d = online();
        assert_eq!(d.status(), ChannelStatus::Online);
        assert!(d.liveness().is_armed());
        assert_eq!(d.link().opens.len(), 1);
    }

    #[test]
    fn execute_echoes_and_ignores_blank() {
        let mut d = online();
        d.handle(Input::User(UserAction::Connect {
            server_name: "S1".into(),
        }));
        frame(&mut d, r#"{"type":"connect_success","server":{"server_name":"S1"}}"#);

        d.handle(Input::User(UserAction::Execute {
            command: "   ".into(),
        }));
        d.handle(Input::User(UserAction::Execute {
            command: " list ".into(),
        }));
        assert_eq!(d.link().sent_actions(), vec!["connect_server", "execute_command"]);
        assert_eq!(d.console().collect::<Vec<_>>(), vec!["> list"]);
    }

    #[test]
    fn console_history_is_bounded() {
        let mut d = online();
        for i in 0..(CONSOLE_HISTORY + 5) {
            frame(&mut d, &format!(r#"{{"type":"server_log","log":"line {i}"}}"#));
        }
        assert_eq!(d.console().count(), CONSOLE_HISTORY);
        assert_eq!(d.console().next(), Some("line 5"));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut d = online();
        assert!(!d.handle(Input::Shutdown));
        assert_eq!(d.channel_state(), ChannelState::Closed);
        assert!(!d.liveness().is_armed());
    }
}
