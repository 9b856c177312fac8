use crate::simulation::{CommunicationHealth, PropulsionHealth, SubsystemHealth, ThermalHealth};
use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum Subsystem {
    Propulsion,
    #[strum(serialize = "Thermal Control")]
    #[serde(rename = "Thermal Control")]
    ThermalControl,
    Communication,
    Power,
    #[strum(serialize = "Spacecraft Bus")]
    #[serde(rename = "Spacecraft Bus")]
    SpacecraftBus,
}

/// One finding of the subsystem health rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthIssue {
    pub component: Subsystem,
    pub status: String,
    pub severity: Severity,
    pub impact: String,
    pub recommendations: Vec<String>,
}

impl HealthIssue {
    fn new(
        component: Subsystem,
        status: impl ToString,
        severity: Severity,
        impact: &str,
        recommendations: &[&str],
    ) -> Self {
        Self {
            component,
            status: status.to_string(),
            severity,
            impact: impact.to_string(),
            recommendations: recommendations.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Applies the fixed rule set to a health reading.
///
/// Issues are reported in rule order: propulsion, thermal, communication.
pub fn analyze_health(health: &SubsystemHealth) -> Vec<HealthIssue> {
    let mut issues = Vec::new();

    if health.propulsion != PropulsionHealth::Operational {
        issues.push(HealthIssue::new(
            Subsystem::Propulsion,
            health.propulsion,
            Severity::High,
            "Mission critical system degraded",
            &[
                "Initiate propulsion diagnostic sequence",
                "Switch to backup thrusters",
                "Adjust orbital parameters",
                "Prepare contingency procedures",
            ],
        ));
    }

    if health.thermal != ThermalHealth::Good {
        issues.push(HealthIssue::new(
            Subsystem::ThermalControl,
            health.thermal,
            Severity::Medium,
            "System temperature outside optimal range",
            &[
                "Adjust thermal control parameters",
                "Reduce power to affected systems",
                "Monitor component temperatures",
                "Enable backup cooling systems",
            ],
        ));
    }

    if health.communication != CommunicationHealth::Stable {
        issues.push(HealthIssue::new(
            Subsystem::Communication,
            health.communication,
            Severity::High,
            "Data transmission reliability compromised",
            &[
                "Switch to backup communication channel",
                "Optimize antenna alignment",
                "Reduce data transmission rate",
                "Enable error correction protocols",
            ],
        ));
    }

    issues
}
