use crate::simulation::SimulationError;
use std::fmt::{Display, Formatter};

/// Failures that end a monitoring run and move the agent into its error state.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    SourceUnavailable(SimulationError),
    StatusUnavailable,
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::SourceUnavailable(e) => write!(f, "Mission data source unavailable: {e}"),
            AgentError::StatusUnavailable => write!(f, "Failed to retrieve system status"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::SourceUnavailable(e) => Some(e),
            AgentError::StatusUnavailable => None,
        }
    }
}

impl From<SimulationError> for AgentError {
    fn from(value: SimulationError) -> Self { AgentError::SourceUnavailable(value) }
}
