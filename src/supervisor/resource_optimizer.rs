use crate::{config::AgentConfig, simulation::SystemStatus};
use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Power,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOptimization {
    pub resource_type: ResourceKind,
    pub current_usage: f64,
    pub recommended_usage: f64,
    pub potential_savings: f64,
    pub priority: AdvisoryPriority,
}

/// Share of the current draw shed by a power advisory.
const POWER_REDUCTION: f64 = 0.2;
/// Fraction of the storage threshold recommended as target usage.
const STORAGE_TARGET_RATIO: f64 = 0.8;

/// Builds the resource advisories for one status reading.
pub fn suggest_optimizations(status: &SystemStatus, config: &AgentConfig) -> Vec<ResourceOptimization> {
    let mut suggestions = Vec::new();

    let battery = status.power.battery_level_pct;
    if battery < config.battery_advisory_pct {
        let draw = status.power.consumption_w;
        suggestions.push(ResourceOptimization {
            resource_type: ResourceKind::Power,
            current_usage: draw,
            recommended_usage: draw * (1.0 - POWER_REDUCTION),
            potential_savings: draw * POWER_REDUCTION,
            priority: if battery < config.battery_high_priority_pct {
                AdvisoryPriority::High
            } else {
                AdvisoryPriority::Medium
            },
        });
    }

    if status.storage_mb > config.storage_threshold_mb {
        let target = config.storage_threshold_mb * STORAGE_TARGET_RATIO;
        suggestions.push(ResourceOptimization {
            resource_type: ResourceKind::Storage,
            current_usage: status.storage_mb,
            recommended_usage: target,
            potential_savings: status.storage_mb - target,
            priority: AdvisoryPriority::High,
        });
    }

    suggestions
}
