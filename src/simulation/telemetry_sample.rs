use super::mission_task::TaskRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ThermalHealth {
    Good,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum PropulsionHealth {
    Operational,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum CommunicationHealth {
    Stable,
    Intermittent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum AttitudeHealth {
    Normal,
}

/// Availability of a ground-station pass or an inter-satellite link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum LinkAvailability {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemHealth {
    pub thermal: ThermalHealth,
    pub propulsion: PropulsionHealth,
    pub communication: CommunicationHealth,
    pub attitude: AttitudeHealth,
}

impl SubsystemHealth {
    pub const NOMINAL: SubsystemHealth = SubsystemHealth {
        thermal: ThermalHealth::Good,
        propulsion: PropulsionHealth::Operational,
        communication: CommunicationHealth::Stable,
        attitude: AttitudeHealth::Normal,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalPosition {
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
}

impl OrbitalPosition {
    pub fn is_finite(&self) -> bool {
        self.x_km.is_finite() && self.y_km.is_finite() && self.z_km.is_finite()
    }
}

/// One synthetic spacecraft reading. Samples are never modified after creation;
/// the window holding them is replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    pub power_consumption_w: f64,
    pub battery_level_pct: f64,
    pub storage_used_mb: f64,
    pub health: SubsystemHealth,
    pub position: OrbitalPosition,
    pub ground_station_visibility: LinkAvailability,
    pub task: Option<TaskRef>,
    pub power_used_w: f64,
    pub memory_used_mb: f64,
    pub bandwidth_used_mbps: f64,
    pub anomaly_id: Option<u32>,
}

impl TelemetrySample {
    pub fn is_valid(&self) -> bool {
        let readings = [
            self.power_consumption_w,
            self.storage_used_mb,
            self.power_used_w,
            self.memory_used_mb,
            self.bandwidth_used_mbps,
        ];
        readings.iter().all(|v| v.is_finite() && *v >= 0.0)
            && (0.0..=100.0).contains(&self.battery_level_pct)
            && self.position.is_finite()
    }
}
