use super::{
    coordination_sample::{ConflictStatus, CoordinationSample, WeatherCondition},
    telemetry_sample::{LinkAvailability, SubsystemHealth, TelemetrySample},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerStatus {
    pub consumption_w: f64,
    pub battery_level_pct: f64,
}

/// Health, power and storage summary derived from the newest telemetry sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub health: SubsystemHealth,
    pub power: PowerStatus,
    pub storage_mb: f64,
    pub bandwidth_mbps: f64,
    pub ground_station: LinkAvailability,
    pub anomaly_id: Option<u32>,
}

impl SystemStatus {
    pub const DEFAULT_CONSUMPTION_W: f64 = 150.0;
    pub const DEFAULT_BATTERY_PCT: f64 = 85.0;
    pub const DEFAULT_STORAGE_MB: f64 = 5000.0;
    pub const DEFAULT_BANDWIDTH_MBPS: f64 = 20.0;
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            health: SubsystemHealth::NOMINAL,
            power: PowerStatus {
                consumption_w: Self::DEFAULT_CONSUMPTION_W,
                battery_level_pct: Self::DEFAULT_BATTERY_PCT,
            },
            storage_mb: Self::DEFAULT_STORAGE_MB,
            bandwidth_mbps: Self::DEFAULT_BANDWIDTH_MBPS,
            ground_station: LinkAvailability::Available,
            anomaly_id: None,
        }
    }
}

impl From<&TelemetrySample> for SystemStatus {
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            health: sample.health,
            power: PowerStatus {
                consumption_w: sample.power_consumption_w,
                battery_level_pct: sample.battery_level_pct,
            },
            storage_mb: sample.storage_used_mb,
            bandwidth_mbps: sample.bandwidth_used_mbps,
            ground_station: sample.ground_station_visibility,
            anomaly_id: sample.anomaly_id,
        }
    }
}

/// Charting point of the performance series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub timestamp: DateTime<Utc>,
    pub power: f64,
    pub battery: f64,
    pub storage: f64,
}

impl PerformancePoint {
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now,
            power: SystemStatus::DEFAULT_CONSUMPTION_W,
            battery: SystemStatus::DEFAULT_BATTERY_PCT,
            storage: SystemStatus::DEFAULT_STORAGE_MB,
        }
    }
}

impl From<&TelemetrySample> for PerformancePoint {
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            timestamp: sample.timestamp,
            power: sample.power_consumption_w,
            battery: sample.battery_level_pct,
            storage: sample.storage_used_mb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthUsage {
    pub used: f64,
    pub available: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkState {
    pub link: LinkAvailability,
    pub conflict: ConflictStatus,
    pub weather: WeatherCondition,
}

/// Display-oriented view of one coordination sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationView {
    pub id: String,
    pub ground_station: String,
    pub bandwidth: BandwidthUsage,
    pub utilization: f64,
    pub status: LinkState,
    pub priority: String,
    pub throughput: f64,
}

impl CoordinationView {
    pub fn placeholder() -> Self {
        let bandwidth = BandwidthUsage { used: 200.0, available: 500.0 };
        Self {
            id: String::from("SAT-001"),
            ground_station: String::from("GS-ALPHA"),
            utilization: bandwidth.used / bandwidth.available,
            bandwidth,
            status: LinkState {
                link: LinkAvailability::Available,
                conflict: ConflictStatus::NoConflict,
                weather: WeatherCondition::Clear,
            },
            priority: String::from("high"),
            throughput: 300.0,
        }
    }
}

impl From<&CoordinationSample> for CoordinationView {
    fn from(sample: &CoordinationSample) -> Self {
        Self {
            id: sample.satellite_id.clone(),
            ground_station: sample.ground_station.clone(),
            bandwidth: BandwidthUsage {
                used: sample.bandwidth_used_mbps,
                available: sample.available_bandwidth_mbps,
            },
            utilization: sample.utilization(),
            status: LinkState {
                link: sample.inter_satellite_link,
                conflict: sample.conflict_status,
                weather: sample.weather_condition,
            },
            priority: sample.priority.as_lowercase().to_string(),
            throughput: sample.throughput_mbps,
        }
    }
}
