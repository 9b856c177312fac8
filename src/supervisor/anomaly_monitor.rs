use super::health_rules::{Severity, Subsystem};
use crate::simulation::SystemStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub anomaly_type: String,
    pub component: Subsystem,
    pub description: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResolution {
    pub alert_id: String,
    pub status: String,
    pub actions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of comparing a new status against the active alert set.
#[derive(Debug, Default)]
pub struct AnomalyUpdate {
    pub raised: Vec<AnomalyAlert>,
    pub resolved: Vec<AlertResolution>,
}

/// Tracks which anomaly alerts are currently raised.
///
/// Alert ids are stable per condition, so an alert stays active across
/// passes until the condition disappears and is then resolved exactly once.
#[derive(Debug)]
pub struct AnomalyMonitor {
    battery_critical_pct: f64,
    active: BTreeMap<String, AnomalyAlert>,
}

impl AnomalyMonitor {
    pub const POWER_CRITICAL_ID: &'static str = "power-critical";

    pub fn new(battery_critical_pct: f64) -> Self {
        Self { battery_critical_pct, active: BTreeMap::new() }
    }

    pub fn detect(&self, status: &SystemStatus, now: DateTime<Utc>) -> Vec<AnomalyAlert> {
        let mut alerts = Vec::new();
        let battery = status.power.battery_level_pct;
        if battery < self.battery_critical_pct {
            alerts.push(AnomalyAlert {
                id: Self::POWER_CRITICAL_ID.to_string(),
                anomaly_type: "POWER_CRITICAL".to_string(),
                component: Subsystem::Power,
                description: format!("Battery level critically low at {battery:.1}%"),
                severity: Severity::Critical,
                value: Some(battery),
                threshold: Some(self.battery_critical_pct),
                recommendations: vec![
                    "Shed non-essential loads".to_string(),
                    "Orient solar arrays for maximum charge".to_string(),
                    "Defer high-power observations".to_string(),
                ],
                timestamp: now,
            });
        }
        if let Some(code) = status.anomaly_id {
            alerts.push(AnomalyAlert {
                id: format!("telemetry-{code}"),
                anomaly_type: "TELEMETRY_ANOMALY".to_string(),
                component: Subsystem::SpacecraftBus,
                description: format!("Telemetry reported anomaly code {code}"),
                severity: Severity::Medium,
                value: Some(f64::from(code)),
                threshold: None,
                recommendations: vec![
                    "Review recent telemetry for the flagged code".to_string(),
                    "Run subsystem self-test".to_string(),
                ],
                timestamp: now,
            });
        }
        alerts
    }

    /// Raises new alerts and resolves the ones whose condition cleared.
    pub fn update(&mut self, status: &SystemStatus, now: DateTime<Utc>) -> AnomalyUpdate {
        let detected = self.detect(status, now);

        let cleared: Vec<String> = self
            .active
            .keys()
            .filter(|id| !detected.iter().any(|a| a.id == **id))
            .cloned()
            .collect();
        let resolved = cleared
            .into_iter()
            .filter_map(|id| self.active.remove(&id))
            .map(|alert| AlertResolution {
                actions: alert.recommendations,
                alert_id: alert.id,
                status: "resolved".to_string(),
                timestamp: now,
            })
            .collect();

        let mut raised = Vec::new();
        for alert in detected {
            if !self.active.contains_key(&alert.id) {
                self.active.insert(alert.id.clone(), alert.clone());
                raised.push(alert);
            }
        }
        AnomalyUpdate { raised, resolved }
    }

    pub fn active(&self) -> impl Iterator<Item = &AnomalyAlert> { self.active.values() }
}
