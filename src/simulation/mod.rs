mod coordination_sample;
mod mission_task;
mod sample_synthesizer;
mod simulation_error;
mod snapshots;
mod telemetry_sample;
mod telemetry_simulator;

pub use coordination_sample::{ConflictStatus, CoordinationSample, WeatherCondition};
pub use mission_task::{MissionTask, TaskPriority, TaskRef, TaskStatus};
pub use sample_synthesizer::{MissionCatalog, RandomSynthesizer, SampleSynthesizer};
pub use simulation_error::SimulationError;
pub use snapshots::{BandwidthUsage, CoordinationView, LinkState, PerformancePoint, PowerStatus, SystemStatus};
pub use telemetry_sample::{
    AttitudeHealth, CommunicationHealth, LinkAvailability, OrbitalPosition, PropulsionHealth,
    SubsystemHealth, TelemetrySample, ThermalHealth,
};
pub use telemetry_simulator::TelemetrySimulator;
