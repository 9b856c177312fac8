use crate::simulation::{MissionTask, SimulationError, SystemStatus, TelemetrySimulator};
use async_trait::async_trait;

/// Where the supervisor reads mission state from.
#[async_trait]
pub trait MissionDataSource: Send + Sync {
    async fn ensure_ready(&self) -> Result<(), SimulationError>;
    /// `None` when no status can be produced at all.
    async fn fetch_status(&self) -> Option<SystemStatus>;
    async fn fetch_tasks(&self) -> Vec<MissionTask>;
}

#[async_trait]
impl MissionDataSource for TelemetrySimulator {
    async fn ensure_ready(&self) -> Result<(), SimulationError> { self.initialize().await }

    async fn fetch_status(&self) -> Option<SystemStatus> { Some(self.latest_status().await) }

    async fn fetch_tasks(&self) -> Vec<MissionTask> {
        // the placeholder task is not a real outcome
        if !self.is_initialized() {
            return Vec::new();
        }
        self.active_tasks().await
    }
}
