use crate::warn;
use std::{env, str::FromStr, time::Duration};

/// Tuning knobs of the telemetry simulator.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of concurrently active mission tasks.
    pub task_count: usize,
    /// Number of samples in each telemetry / coordination window.
    pub window_size: usize,
    /// Period of the task countdown tick.
    pub tick_interval: Duration,
    /// Period of the window regeneration tick.
    pub regeneration_interval: Duration,
    /// Period after which the synthesis error counter is cleared.
    pub error_reset_interval: Duration,
    /// Consecutive synthesis failures before falling back to defaults.
    pub max_consecutive_failures: u32,
    /// Fixed RNG seed, `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub const DEFAULT_TASK_COUNT: usize = 5;
    pub const DEFAULT_WINDOW_SIZE: usize = 5;
    pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
    pub const ERROR_RESET_INTERVAL: Duration = Duration::from_secs(60);
    pub const MAX_RETRIES: u32 = 3;
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            task_count: Self::DEFAULT_TASK_COUNT,
            window_size: Self::DEFAULT_WINDOW_SIZE,
            tick_interval: Self::DEFAULT_TICK,
            regeneration_interval: Self::DEFAULT_TICK,
            error_reset_interval: Self::ERROR_RESET_INTERVAL,
            max_consecutive_failures: Self::MAX_RETRIES,
            seed: None,
        }
    }
}

/// Thresholds and timing of the supervisor agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub monitor_interval: Duration,
    pub optimization_interval: Duration,
    /// Storage level (MB) above which a storage reduction is advised.
    pub storage_threshold_mb: f64,
    /// Battery level (%) below which a power reduction is advised.
    pub battery_advisory_pct: f64,
    /// Battery level (%) below which the power advisory turns high priority.
    pub battery_high_priority_pct: f64,
    /// Battery level (%) below which a critical power anomaly is raised.
    pub battery_critical_pct: f64,
    /// Number of historical values kept per predicted metric.
    pub history_len: usize,
}

impl AgentConfig {
    pub const MONITOR_INTERVAL: Duration = Duration::from_secs(3);
    pub const OPTIMIZATION_INTERVAL: Duration = Duration::from_secs(300);
    /// Titan observation storage budget.
    pub const STORAGE_THRESHOLD_MB: f64 = 8000.0;
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Self::MONITOR_INTERVAL,
            optimization_interval: Self::OPTIMIZATION_INTERVAL,
            storage_threshold_mb: Self::STORAGE_THRESHOLD_MB,
            battery_advisory_pct: 70.0,
            battery_high_priority_pct: 50.0,
            battery_critical_pct: 20.0,
            history_len: 10,
        }
    }
}

/// Location of the mission advisor endpoint.
#[derive(Debug, Clone, Default)]
pub struct AdvisorConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MissionConfig {
    pub simulation: SimulationConfig,
    pub agent: AgentConfig,
    pub advisor: AdvisorConfig,
}

impl MissionConfig {
    /// Builds the configuration from `NEBULA_*` environment variables,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        let sim = &mut cfg.simulation;
        sim.seed = env_parse("NEBULA_SEED");
        sim.task_count = env_parse("NEBULA_TASK_COUNT").unwrap_or(sim.task_count);
        sim.window_size = env_parse("NEBULA_WINDOW_SIZE").unwrap_or(sim.window_size);
        if let Some(tick) = env_period("NEBULA_TICK_MS") {
            sim.tick_interval = tick;
            sim.regeneration_interval = tick;
        }

        let agent = &mut cfg.agent;
        agent.monitor_interval = env_period("NEBULA_MONITOR_MS").unwrap_or(agent.monitor_interval);
        agent.optimization_interval =
            env_period("NEBULA_OPTIMIZE_MS").unwrap_or(agent.optimization_interval);
        agent.storage_threshold_mb =
            env_parse("NEBULA_STORAGE_THRESHOLD_MB").unwrap_or(agent.storage_threshold_mb);

        cfg.advisor.url = env::var("NEBULA_ADVISOR_URL").ok().filter(|u| !u.trim().is_empty());
        cfg
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    parse_or_warn(key, &raw)
}

fn env_period(key: &str) -> Option<Duration> {
    let raw = env::var(key).ok()?;
    parse_period_or_warn(key, &raw)
}

/// Parses a millisecond period. Zero is rejected since a timer cannot tick at it.
fn parse_period_or_warn(key: &str, raw: &str) -> Option<Duration> {
    match parse_or_warn::<u64>(key, raw)? {
        0 => {
            warn!("Ignoring zero period for {key}, using default.");
            None
        }
        ms => Some(Duration::from_millis(ms)),
    }
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        warn!("Ignoring unparseable value {raw:?} for {key}, using default.");
    }
    parsed
}
