use super::{
    mission_task::TaskPriority,
    telemetry_sample::{LinkAvailability, OrbitalPosition},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ConflictStatus {
    #[strum(serialize = "No Conflict")]
    #[serde(rename = "No Conflict")]
    NoConflict,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Rain,
    Storm,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 3] =
        [WeatherCondition::Clear, WeatherCondition::Rain, WeatherCondition::Storm];
}

/// One synthetic inter-satellite coordination reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationSample {
    pub timestamp: DateTime<Utc>,
    pub satellite_id: String,
    pub ground_station: String,
    pub inter_satellite_link: LinkAvailability,
    pub bandwidth_used_mbps: f64,
    pub available_bandwidth_mbps: f64,
    pub conflict_status: ConflictStatus,
    pub conflict_resolution: String,
    pub weather_condition: WeatherCondition,
    pub priority: TaskPriority,
    pub position: OrbitalPosition,
    pub throughput_mbps: f64,
}

impl CoordinationSample {
    /// Share of the available bandwidth in use, `0.0` when nothing is available.
    pub fn utilization(&self) -> f64 {
        if self.available_bandwidth_mbps > 0.0 {
            self.bandwidth_used_mbps / self.available_bandwidth_mbps
        } else {
            0.0
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.bandwidth_used_mbps, self.available_bandwidth_mbps, self.throughput_mbps]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && self.position.is_finite()
    }
}
