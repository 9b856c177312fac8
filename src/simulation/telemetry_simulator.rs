use super::{
    coordination_sample::CoordinationSample,
    mission_task::MissionTask,
    sample_synthesizer::{MissionCatalog, RandomSynthesizer, SampleSynthesizer},
    simulation_error::SimulationError,
    snapshots::{CoordinationView, PerformancePoint, SystemStatus},
    telemetry_sample::TelemetrySample,
};
use crate::{config::SimulationConfig, error, event, info, warn};
use chrono::{DateTime, Utc};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{OnceCell, RwLock},
    time::{Instant, interval_at},
};
use tokio_util::sync::CancellationToken;

/// `interval_at` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owner of the synthetic mission state.
///
/// The simulator is a cheap, clonable handle; all clones share the same state
/// and timers. Every read accessor is total: while the simulator is not
/// initialized (or has fallen back after repeated synthesis failures) the
/// accessors return fixed safe defaults instead of failing.
#[derive(Clone)]
pub struct TelemetrySimulator {
    core: Arc<SimulatorCore>,
}

struct SimulatorCore {
    config: SimulationConfig,
    synthesizer: Arc<dyn SampleSynthesizer>,
    state: RwLock<MissionState>,
    init_outcome: OnceCell<Result<(), SimulationError>>,
    initialized: AtomicBool,
    update_in_progress: AtomicBool,
    error_count: AtomicU32,
    c_tok: CancellationToken,
}

/// Both windows live behind one lock so readers always see a matching pair.
#[derive(Default)]
struct MissionState {
    telemetry: Vec<TelemetrySample>,
    coordination: Vec<CoordinationSample>,
    tasks: Vec<MissionTask>,
    last_update: Option<DateTime<Utc>>,
}

impl TelemetrySimulator {
    /// Creates a simulator backed by the default Saturn mission catalog.
    pub fn new(config: SimulationConfig) -> Self {
        let synthesizer = RandomSynthesizer::new(MissionCatalog::default(), config.seed);
        Self::with_synthesizer(config, Arc::new(synthesizer))
    }

    pub fn with_synthesizer(config: SimulationConfig, synthesizer: Arc<dyn SampleSynthesizer>) -> Self {
        Self {
            core: Arc::new(SimulatorCore {
                config,
                synthesizer,
                state: RwLock::new(MissionState::default()),
                init_outcome: OnceCell::new(),
                initialized: AtomicBool::new(false),
                update_in_progress: AtomicBool::new(false),
                error_count: AtomicU32::new(0),
                c_tok: CancellationToken::new(),
            }),
        }
    }

    /// Seeds the task set, generates the first windows and starts the timers.
    ///
    /// The work happens exactly once; concurrent and repeated callers all
    /// receive the outcome of that single attempt, including its error.
    pub async fn initialize(&self) -> Result<(), SimulationError> {
        self.core.init_outcome.get_or_init(|| self.seed_and_start()).await.clone()
    }

    async fn seed_and_start(&self) -> Result<(), SimulationError> {
        if let Err(e) = self.core.seed().await {
            error!("Telemetry simulator initialization failed: {e}");
            return Err(e);
        }
        let core = Arc::clone(&self.core);
        tokio::spawn(async move { core.run().await });
        info!(
            "Telemetry simulator online with {} tasks and {}-sample windows.",
            self.core.config.task_count, self.core.config.window_size
        );
        Ok(())
    }

    /// Stops the periodic timers. Snapshots stay readable.
    pub fn shutdown(&self) { self.core.c_tok.cancel(); }

    pub fn is_initialized(&self) -> bool { self.core.initialized.load(Ordering::Acquire) }

    /// Number of synthesis failures since the last success or reset.
    pub fn error_count(&self) -> u32 { self.core.error_count.load(Ordering::Acquire) }

    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.core.state.read().await.last_update
    }

    pub async fn latest_status(&self) -> SystemStatus {
        if !self.is_initialized() {
            return SystemStatus::default();
        }
        self.core.state.read().await.telemetry.first().map_or_else(SystemStatus::default, SystemStatus::from)
    }

    /// Current telemetry window as a chart series, oldest sample first.
    pub async fn performance_series(&self) -> Vec<PerformancePoint> {
        if !self.is_initialized() {
            return vec![PerformancePoint::fallback(Utc::now())];
        }
        let state = self.core.state.read().await;
        if state.telemetry.is_empty() {
            return vec![PerformancePoint::fallback(Utc::now())];
        }
        state.telemetry.iter().rev().map(PerformancePoint::from).collect()
    }

    pub async fn active_tasks(&self) -> Vec<MissionTask> {
        if !self.is_initialized() {
            return vec![MissionTask::placeholder(Utc::now())];
        }
        self.core.state.read().await.tasks.clone()
    }

    pub async fn coordination_snapshot(&self) -> Vec<CoordinationView> {
        if !self.is_initialized() {
            return vec![CoordinationView::placeholder()];
        }
        let state = self.core.state.read().await;
        if state.coordination.is_empty() {
            return vec![CoordinationView::placeholder()];
        }
        state.coordination.iter().map(CoordinationView::from).collect()
    }

    /// Regenerates both windows immediately, sharing the timer's re-entrancy guard.
    ///
    /// # Returns
    /// `false` if the simulator was never initialized or another regeneration
    /// was already in flight.
    pub async fn refresh(&self) -> bool {
        if !matches!(self.core.init_outcome.get(), Some(Ok(()))) {
            return false;
        }
        self.core.regenerate().await
    }

    /// Advances every task to `now`, replacing completed ones.
    pub(crate) async fn tick_tasks(&self, now: DateTime<Utc>) -> usize {
        self.core.advance_tasks(now).await
    }
}

impl SimulatorCore {
    async fn seed(&self) -> Result<(), SimulationError> {
        self.synthesizer.validate()?;
        let now = Utc::now();
        let tasks = (0..self.config.task_count)
            .map(|_| self.synthesizer.new_task(now))
            .collect::<Result<Vec<_>, _>>()?;
        let telemetry = self.synthesizer.telemetry_window(&tasks, now, self.config.window_size)?;
        let coordination = self.synthesizer.coordination_window(now, self.config.window_size)?;

        *self.state.write().await = MissionState {
            telemetry,
            coordination,
            tasks,
            last_update: Some(now),
        };
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn run(self: Arc<Self>) {
        let start = Instant::now();
        let tick_dt = self.config.tick_interval.max(MIN_PERIOD);
        let regen_dt = self.config.regeneration_interval.max(MIN_PERIOD);
        let reset_dt = self.config.error_reset_interval.max(MIN_PERIOD);
        let mut task_tick = interval_at(start + tick_dt, tick_dt);
        let mut regen_tick = interval_at(start + regen_dt, regen_dt);
        let mut reset_tick = interval_at(start + reset_dt, reset_dt);

        loop {
            tokio::select! {
                () = self.c_tok.cancelled() => break,
                _ = task_tick.tick() => {
                    self.advance_tasks(Utc::now()).await;
                }
                _ = regen_tick.tick() => {
                    self.regenerate().await;
                }
                _ = reset_tick.tick() => {
                    self.error_count.store(0, Ordering::Release);
                }
            }
        }
        info!("Telemetry simulator timers stopped.");
    }

    async fn advance_tasks(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.write().await;
        let mut replaced = 0;
        for task in &mut state.tasks {
            if !task.advance(now) {
                continue;
            }
            match self.synthesizer.new_task(now) {
                Ok(next) => {
                    event!("Task {} completed, scheduling {next}", task.id());
                    *task = next;
                    replaced += 1;
                }
                // the finished task stays in place and is retried on the next tick
                Err(e) => warn!("Could not replace completed task {}: {e}", task.id()),
            }
        }
        replaced
    }

    /// One guarded regeneration cycle.
    ///
    /// # Returns
    /// `false` if a cycle was already in flight and this call did nothing.
    async fn regenerate(&self) -> bool {
        if self
            .update_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            event!("Window regeneration already in progress, skipping cycle.");
            return false;
        }

        match self.synthesize_windows().await {
            Ok(()) => {
                self.error_count.store(0, Ordering::Release);
                if !self.initialized.swap(true, Ordering::AcqRel) {
                    info!("Telemetry synthesis recovered, live data restored.");
                }
            }
            Err(e) => {
                let failures = self.error_count.fetch_add(1, Ordering::AcqRel) + 1;
                warn!("Telemetry synthesis failed ({failures} in a row): {e}");
                if failures >= self.config.max_consecutive_failures
                    && self.initialized.swap(false, Ordering::AcqRel)
                {
                    error!("Telemetry synthesis failed {failures} times, serving defaults.");
                }
            }
        }

        self.update_in_progress.store(false, Ordering::Release);
        true
    }

    async fn synthesize_windows(&self) -> Result<(), SimulationError> {
        let tasks = self.state.read().await.tasks.clone();
        let now = Utc::now();
        let telemetry = self.synthesizer.telemetry_window(&tasks, now, self.config.window_size)?;
        let coordination = self.synthesizer.coordination_window(now, self.config.window_size)?;

        let mut state = self.state.write().await;
        state.telemetry = telemetry;
        state.coordination = coordination;
        state.last_update = Some(now);
        Ok(())
    }
}
