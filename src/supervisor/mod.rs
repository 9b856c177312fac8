mod agent_error;
mod agent_event;
mod agent_metrics;
mod anomaly_monitor;
mod health_rules;
mod mission_data_source;
mod resource_optimizer;
mod supervisor_agent;
#[cfg(test)]
mod tests;
mod trend_model;

pub use agent_error::AgentError;
pub use agent_event::{
    AgentEvent, AgentEventKind, AgentEventPayload, AgentState, AnomalyReport, ErrorReport,
    HealthReport, OptimizationReport, StatusUpdate,
};
pub use agent_metrics::{AgentMetrics, MissionLedger};
pub use anomaly_monitor::{AlertResolution, AnomalyAlert, AnomalyMonitor, AnomalyUpdate};
pub use health_rules::{HealthIssue, Severity, Subsystem, analyze_health};
pub use mission_data_source::MissionDataSource;
pub use resource_optimizer::{
    AdvisoryPriority, ResourceKind, ResourceOptimization, suggest_optimizations,
};
pub use supervisor_agent::SupervisorAgent;
pub use trend_model::{Metric, MetricPrediction, Prediction, PredictionSnapshot, TrendModel, predict};
