use super::{
    coordination_sample::{ConflictStatus, CoordinationSample, WeatherCondition},
    mission_task::{MissionTask, TaskPriority, TaskRef, TaskStatus},
    simulation_error::SimulationError,
    telemetry_sample::{
        AttitudeHealth, CommunicationHealth, LinkAvailability, OrbitalPosition,
        PropulsionHealth, SubsystemHealth, TelemetrySample, ThermalHealth,
    },
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng, distr::Alphanumeric, rngs::StdRng, seq::IndexedRandom};
use std::sync::{Mutex, MutexGuard};

/// Source of synthetic samples and tasks used by the telemetry simulator.
pub trait SampleSynthesizer: Send + Sync {
    /// Checks that the synthesizer is able to produce data at all.
    fn validate(&self) -> Result<(), SimulationError>;

    fn new_task(&self, now: DateTime<Utc>) -> Result<MissionTask, SimulationError>;

    /// Produces `size` telemetry samples, newest first.
    fn telemetry_window(
        &self,
        tasks: &[MissionTask],
        now: DateTime<Utc>,
        size: usize,
    ) -> Result<Vec<TelemetrySample>, SimulationError>;

    fn coordination_window(
        &self,
        now: DateTime<Utc>,
        size: usize,
    ) -> Result<Vec<CoordinationSample>, SimulationError>;
}

/// Fixed name sets the synthesizer draws from.
#[derive(Debug, Clone)]
pub struct MissionCatalog {
    pub task_names: Vec<String>,
    pub ground_stations: Vec<String>,
}

impl Default for MissionCatalog {
    fn default() -> Self {
        let task_names = [
            "Saturn Ring Analysis",
            "Saturn Atmospheric Study",
            "Titan Surface Mapping",
            "Enceladus Plume Analysis",
            "Magnetosphere Measurements",
            "Radio Science",
            "Infrared Spectroscopy",
            "Saturn Aurora Imaging",
            "Ring Particle Analysis",
            "Moon Orbital Dynamics",
        ];
        let ground_stations = ["GS-ALPHA", "GS-BETA", "GS-GAMMA", "GS-DELTA", "GS-EPSILON"];
        Self {
            task_names: task_names.iter().map(ToString::to_string).collect(),
            ground_stations: ground_stations.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Uniform random-walk synthesizer modelled on a Saturn orbiter.
pub struct RandomSynthesizer {
    catalog: MissionCatalog,
    rng: Mutex<StdRng>,
}

impl RandomSynthesizer {
    const TASK_DURATION_MIN: std::ops::Range<u32> = 30..120;
    const TASK_FAILURE_P: f64 = 0.05;
    const THERMAL_WARNING_P: f64 = 0.2;
    const PROPULSION_DEGRADED_P: f64 = 0.1;
    const COMMS_INTERMITTENT_P: f64 = 0.15;
    const GS_UNAVAILABLE_P: f64 = 0.1;
    const ANOMALY_P: f64 = 0.2;
    const LINK_UNAVAILABLE_P: f64 = 0.1;
    const CONFLICT_P: f64 = 0.1;
    const ID_SUFFIX_LEN: usize = 9;
    /// Spacecraft position range (x, y, z) in km, centred on Saturn.
    const SATURN_ORBIT_SPAN_KM: (f64, f64, f64) = (1_200_000.0, 1_500_000.0, 800_000.0);
    /// Relay constellation position range (x, y, z) in km.
    const RELAY_ORBIT_SPAN_KM: (f64, f64, f64) = (20_000.0, 30_000.0, 15_000.0);

    pub fn new(catalog: MissionCatalog, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { catalog, rng: Mutex::new(rng) }
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().expect("[FATAL] Mutex poisoned: Failed to acquire synthesizer RNG")
    }

    fn uniform(rng: &mut StdRng, base: f64, span: f64) -> f64 { base + rng.random::<f64>() * span }

    fn position(rng: &mut StdRng, span: (f64, f64, f64)) -> OrbitalPosition {
        OrbitalPosition {
            x_km: Self::uniform(rng, -span.0, 2.0 * span.0),
            y_km: Self::uniform(rng, -span.1, 2.0 * span.1),
            z_km: Self::uniform(rng, -span.2, 2.0 * span.2),
        }
    }

    fn priority(rng: &mut StdRng) -> TaskPriority {
        TaskPriority::ALL[rng.random_range(0..TaskPriority::ALL.len())]
    }

    fn task_id(rng: &mut StdRng, now: DateTime<Utc>) -> String {
        let suffix: String = (0..Self::ID_SUFFIX_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
            .collect();
        format!("task-{}-{suffix}", now.timestamp_millis())
    }

    fn health(rng: &mut StdRng) -> SubsystemHealth {
        SubsystemHealth {
            thermal: if rng.random_bool(Self::THERMAL_WARNING_P) {
                ThermalHealth::Warning
            } else {
                ThermalHealth::Good
            },
            propulsion: if rng.random_bool(Self::PROPULSION_DEGRADED_P) {
                PropulsionHealth::Degraded
            } else {
                PropulsionHealth::Operational
            },
            communication: if rng.random_bool(Self::COMMS_INTERMITTENT_P) {
                CommunicationHealth::Intermittent
            } else {
                CommunicationHealth::Stable
            },
            attitude: AttitudeHealth::Normal,
        }
    }

    fn availability(rng: &mut StdRng, p_unavailable: f64) -> LinkAvailability {
        if rng.random_bool(p_unavailable) {
            LinkAvailability::Unavailable
        } else {
            LinkAvailability::Available
        }
    }
}

impl SampleSynthesizer for RandomSynthesizer {
    fn validate(&self) -> Result<(), SimulationError> {
        if self.catalog.task_names.is_empty() {
            return Err(SimulationError::EmptyCatalog("task names"));
        }
        if self.catalog.ground_stations.is_empty() {
            return Err(SimulationError::EmptyCatalog("ground stations"));
        }
        Ok(())
    }

    fn new_task(&self, now: DateTime<Utc>) -> Result<MissionTask, SimulationError> {
        let mut rng = self.lock_rng();
        let name = self
            .catalog
            .task_names
            .choose(&mut *rng)
            .ok_or(SimulationError::EmptyCatalog("task names"))?
            .clone();
        let status = if rng.random_bool(Self::TASK_FAILURE_P) {
            TaskStatus::Failed
        } else {
            TaskStatus::Success
        };
        Ok(MissionTask::new(
            Self::task_id(&mut rng, now),
            name,
            Self::priority(&mut rng),
            status,
            now,
            rng.random_range(Self::TASK_DURATION_MIN),
        ))
    }

    fn telemetry_window(
        &self,
        tasks: &[MissionTask],
        now: DateTime<Utc>,
        size: usize,
    ) -> Result<Vec<TelemetrySample>, SimulationError> {
        let mut rng = self.lock_rng();
        let rng = &mut *rng;
        let mut window = Vec::with_capacity(size);
        for (i, minutes_ago) in (0..size).zip(0_i64..) {
            let sample = TelemetrySample {
                timestamp: now - TimeDelta::minutes(minutes_ago),
                power_consumption_w: Self::uniform(rng, 150.0, 100.0),
                battery_level_pct: Self::uniform(rng, 70.0, 30.0),
                storage_used_mb: Self::uniform(rng, 4000.0, 4000.0),
                health: Self::health(rng),
                position: Self::position(rng, Self::SATURN_ORBIT_SPAN_KM),
                ground_station_visibility: Self::availability(rng, Self::GS_UNAVAILABLE_P),
                task: tasks.get(i).map(TaskRef::from),
                power_used_w: Self::uniform(rng, 100.0, 100.0),
                memory_used_mb: Self::uniform(rng, 100.0, 200.0),
                bandwidth_used_mbps: Self::uniform(rng, 10.0, 20.0),
                anomaly_id: rng.random_bool(Self::ANOMALY_P).then(|| rng.random_range(0..100)),
            };
            if !sample.is_valid() {
                return Err(SimulationError::InvalidSample(format!("telemetry sample {i}")));
            }
            window.push(sample);
        }
        Ok(window)
    }

    fn coordination_window(
        &self,
        now: DateTime<Utc>,
        size: usize,
    ) -> Result<Vec<CoordinationSample>, SimulationError> {
        let mut rng = self.lock_rng();
        let rng = &mut *rng;
        let mut window = Vec::with_capacity(size);
        for i in 0..size {
            let ground_station = self
                .catalog
                .ground_stations
                .choose(&mut *rng)
                .ok_or(SimulationError::EmptyCatalog("ground stations"))?
                .clone();
            let sample = CoordinationSample {
                timestamp: now,
                satellite_id: format!("SAT-{:03}", i + 1),
                ground_station,
                inter_satellite_link: Self::availability(rng, Self::LINK_UNAVAILABLE_P),
                bandwidth_used_mbps: Self::uniform(rng, 100.0, 400.0),
                available_bandwidth_mbps: Self::uniform(rng, 600.0, 400.0),
                conflict_status: if rng.random_bool(Self::CONFLICT_P) {
                    ConflictStatus::Conflict
                } else {
                    ConflictStatus::NoConflict
                },
                conflict_resolution: String::from("Granted"),
                weather_condition: WeatherCondition::ALL
                    [rng.random_range(0..WeatherCondition::ALL.len())],
                priority: Self::priority(rng),
                position: Self::position(rng, Self::RELAY_ORBIT_SPAN_KM),
                throughput_mbps: Self::uniform(rng, 200.0, 500.0),
            };
            if !sample.is_valid() {
                return Err(SimulationError::InvalidSample(format!("coordination sample {i}")));
            }
            window.push(sample);
        }
        Ok(window)
    }
}
