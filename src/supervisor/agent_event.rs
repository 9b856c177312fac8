use super::{
    anomaly_monitor::{AlertResolution, AnomalyAlert},
    health_rules::HealthIssue,
    resource_optimizer::ResourceOptimization,
};
use crate::event_bus::BusEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Running,
    Error,
}

/// Names under which handlers subscribe to agent events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum AgentEventKind {
    Status,
    Error,
    HealthAlert,
    AnomalyAlert,
    ResourceOptimization,
    AlertResolved,
}

impl AgentEventKind {
    pub const ALL: [Self; 6] = [
        Self::Status,
        Self::Error,
        Self::HealthAlert,
        Self::AnomalyAlert,
        Self::ResourceOptimization,
        Self::AlertResolved,
    ];
}

/// A state change (`previous` set) or a no-op notice (`previous` empty).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub state: AgentState,
    pub previous: Option<AgentState>,
    pub message: String,
}

impl StatusUpdate {
    pub fn is_transition(&self) -> bool { self.previous.is_some() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub issues: Vec<HealthIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub alerts: Vec<AnomalyAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub optimizations: Vec<ResourceOptimization>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum AgentEventPayload {
    Status(StatusUpdate),
    Error(ErrorReport),
    HealthAlert(HealthReport),
    AnomalyAlert(AnomalyReport),
    ResourceOptimization(OptimizationReport),
    AlertResolved(AlertResolution),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentEvent {
    #[serde(flatten)]
    pub payload: AgentEventPayload,
    pub timestamp: DateTime<Utc>,
}

impl AgentEvent {
    pub fn new(payload: AgentEventPayload) -> Self { Self { payload, timestamp: Utc::now() } }
}

impl BusEvent for AgentEvent {
    type Kind = AgentEventKind;

    fn kind(&self) -> AgentEventKind {
        match &self.payload {
            AgentEventPayload::Status(_) => AgentEventKind::Status,
            AgentEventPayload::Error(_) => AgentEventKind::Error,
            AgentEventPayload::HealthAlert(_) => AgentEventKind::HealthAlert,
            AgentEventPayload::AnomalyAlert(_) => AgentEventKind::AnomalyAlert,
            AgentEventPayload::ResourceOptimization(_) => AgentEventKind::ResourceOptimization,
            AgentEventPayload::AlertResolved(_) => AgentEventKind::AlertResolved,
        }
    }
}
