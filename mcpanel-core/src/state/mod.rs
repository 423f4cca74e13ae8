pub mod liveness;
pub mod reconnect;
pub mod selection;
pub mod session;
pub mod telemetry;

pub use liveness::LivenessMonitor;
pub use reconnect::{
    FixedJitter, Jitter, RandomJitter, ReconnectOutcome, ReconnectPhase, ReconnectPolicy,
};
pub use selection::ConfigSelection;
pub use session::ConnectionSession;
pub use telemetry::{AdvancedMetrics, TelemetryState};
