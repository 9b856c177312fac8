use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// A catalog the synthesizer draws from has no entries.
    EmptyCatalog(&'static str),
    /// A generated reading is out of range or not finite.
    InvalidSample(String),
    /// Generic synthesis failure.
    Synthesis(String),
}

impl Display for SimulationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::EmptyCatalog(what) => write!(f, "catalog of {what} is empty"),
            SimulationError::InvalidSample(what) => write!(f, "invalid sample: {what}"),
            SimulationError::Synthesis(what) => write!(f, "synthesis failed: {what}"),
        }
    }
}

impl std::error::Error for SimulationError {}
