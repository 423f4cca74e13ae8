//! Latest telemetry sample and the advanced-metrics visibility rule.

use crate::protocol::{Metric, TelemetrySample};

/// Platform that exposes tick metrics without Spark.
const PAPER: &str = "Paper";

/// Whether tps, mspt and player counts can be shown.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvancedMetrics {
    Visible {
        tps: Metric,
        mspt: Metric,
        players_online: Metric,
        players_max: Metric,
    },
    /// Connected, but the server has neither Spark nor Paper.
    NeedsSpark,
    /// Not connected.
    Unavailable,
}

impl AdvancedMetrics {
    pub fn project(sample: &TelemetrySample, platform_type: &str, connected: bool) -> Self {
        if !connected {
            return Self::Unavailable;
        }
        if sample.spark_installed || platform_type == PAPER {
            Self::Visible {
                tps: sample.tps.clone(),
                mspt: sample.mspt.clone(),
                players_online: sample.players_online.clone(),
                players_max: sample.players_max.clone(),
            }
        } else {
            Self::NeedsSpark
        }
    }
}

impl std::fmt::Display for AdvancedMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visible {
                tps,
                mspt,
                players_online,
                players_max,
            } => write!(f, "tps {tps} | mspt {mspt} | players {players_online}/{players_max}"),
            Self::NeedsSpark => write!(f, "install Spark to enable tick metrics"),
            Self::Unavailable => write!(f, "tps -- | mspt -- | players --/--"),
        }
    }
}

/// The most recent `server_status`. No history is kept.
#[derive(Debug, Clone, Default)]
pub struct TelemetryState {
    latest: Option<(TelemetrySample, String)>,
}

impl TelemetryState {
    /// Replace the sample wholesale and project advanced metrics.
    pub fn update(
        &mut self,
        sample: TelemetrySample,
        platform_type: String,
        connected: bool,
    ) -> AdvancedMetrics {
        let advanced = AdvancedMetrics::project(&sample, &platform_type, connected);
        self.latest = Some((sample, platform_type));
        advanced
    }

    /// Advanced metrics for the stored sample under the given session.
    pub fn advanced(&self, connected: bool) -> AdvancedMetrics {
        match &self.latest {
            Some((sample, platform)) => AdvancedMetrics::project(sample, platform, connected),
            None => AdvancedMetrics::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(spark: bool) -> TelemetrySample {
        TelemetrySample {
            tps: Metric::Number(19.9),
            mspt: Metric::Number(12.34),
            players_online: Metric::Text("3".into()),
            players_max: Metric::Text("20".into()),
            spark_installed: spark,
            ..Default::default()
        }
    }

    #[test]
    fn hidden_when_disconnected() {
        assert_eq!(
            AdvancedMetrics::project(&sample(true), "Paper", false),
            AdvancedMetrics::Unavailable
        );
    }

    #[test]
    fn visible_with_spark_or_paper() {
        assert!(matches!(
            AdvancedMetrics::project(&sample(true), "Fabric", true),
            AdvancedMetrics::Visible { .. }
        ));
        assert!(matches!(
            AdvancedMetrics::project(&sample(false), "Paper", true),
            AdvancedMetrics::Visible { .. }
        ));
        assert_eq!(
            AdvancedMetrics::project(&sample(false), "Vanilla", true),
            AdvancedMetrics::NeedsSpark
        );
    }

    #[test]
    fn display_formats_numbers() {
        let m = AdvancedMetrics::project(&sample(true), "", true);
        assert_eq!(m.to_string(), "tps 19.9 | mspt 12.3 | players 3/20");
    }

    #[test]
    fn update_replaces_sample() {
        let mut t = TelemetryState::default();
        assert_eq!(t.advanced(true), AdvancedMetrics::Unavailable);
        t.update(sample(false), "Vanilla".into(), true);
        assert_eq!(t.advanced(true), AdvancedMetrics::NeedsSpark);
        t.update(sample(true), "Vanilla".into(), true);
        assert!(matches!(t.advanced(true), AdvancedMetrics::Visible { .. }));
        assert_eq!(t.advanced(false), AdvancedMetrics::Unavailable);
    }
}
