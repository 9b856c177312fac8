use super::{
    agent_error::AgentError,
    agent_event::{
        AgentEvent, AgentEventKind, AgentEventPayload, AgentState, AnomalyReport, ErrorReport,
        HealthReport, OptimizationReport, StatusUpdate,
    },
    agent_metrics::{AgentMetrics, MissionLedger},
    anomaly_monitor::AnomalyMonitor,
    health_rules::analyze_health,
    mission_data_source::MissionDataSource,
    resource_optimizer::{ResourceOptimization, suggest_optimizations},
    trend_model::{PredictionSnapshot, TrendModel},
};
use crate::{
    alert,
    config::AgentConfig,
    error, event,
    event_bus::{EventBus, HandlerError, SubscriptionId},
    info, log,
};
use chrono::Utc;
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;

/// `interval_at` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic mission supervisor.
///
/// Observes a [`MissionDataSource`], applies health, anomaly, trend and
/// resource rules and publishes its findings as [`AgentEvent`]s. Cloning
/// yields another handle to the same agent.
#[derive(Clone)]
pub struct SupervisorAgent {
    core: Arc<AgentCore>,
}

struct AgentCore {
    config: AgentConfig,
    source: Arc<dyn MissionDataSource>,
    bus: EventBus<AgentEvent>,
    state: Mutex<AgentState>,
    loop_tok: Mutex<Option<CancellationToken>>,
    model: tokio::sync::Mutex<AgentModel>,
}

struct AgentModel {
    trends: TrendModel,
    anomalies: AnomalyMonitor,
    optimizations: Vec<ResourceOptimization>,
    ledger: MissionLedger,
    metrics: AgentMetrics,
}

impl SupervisorAgent {
    pub fn new(config: AgentConfig, source: Arc<dyn MissionDataSource>) -> Self {
        let model = AgentModel {
            trends: TrendModel::new(config.history_len),
            anomalies: AnomalyMonitor::new(config.battery_critical_pct),
            optimizations: Vec::new(),
            ledger: MissionLedger::default(),
            metrics: AgentMetrics::new(Utc::now()),
        };
        Self {
            core: Arc::new(AgentCore {
                config,
                source,
                bus: EventBus::new(),
                state: Mutex::new(AgentState::Idle),
                loop_tok: Mutex::new(None),
                model: tokio::sync::Mutex::new(model),
            }),
        }
    }

    /// Starts supervision: readies the source, runs one monitoring pass and
    /// arms the periodic loops.
    ///
    /// Calling `start` on a running agent only emits a status notice.
    /// Any failure leaves the agent in [`AgentState::Error`] with no loop armed.
    pub async fn start(&self) -> Result<(), AgentError> {
        let core = &self.core;
        let c_tok = {
            let mut state = core.lock_state();
            if *state == AgentState::Running {
                drop(state);
                core.notify("Agent is already running");
                return Ok(());
            }
            let previous = std::mem::replace(&mut *state, AgentState::Running);
            let c_tok = CancellationToken::new();
            if let Some(old) = core.lock_loop_tok().replace(c_tok.clone()) {
                old.cancel();
            }
            drop(state);
            core.emit_transition(AgentState::Running, previous, "Starting agent...");
            c_tok
        };

        if let Err(e) = core.source.ensure_ready().await {
            let e = AgentError::from(e);
            core.handle_error(&e, &c_tok);
            return Err(e);
        }
        if let Err(e) = core.monitor_system(&c_tok).await {
            core.handle_error(&e, &c_tok);
            return Err(e);
        }
        if core.spawn_loops(c_tok) {
            info!("Supervisor agent running.");
        }
        Ok(())
    }

    /// Stops both loops and returns to idle. A pass already in flight completes
    /// without emitting further events.
    pub fn stop(&self) {
        let core = &self.core;
        {
            let mut state = core.lock_state();
            if *state != AgentState::Running {
                drop(state);
                core.notify("Agent is not running");
                return;
            }
            *state = AgentState::Idle;
        }
        core.cancel_loops();
        info!("Supervisor agent stopped.");
        core.emit_transition(AgentState::Idle, AgentState::Running, "Agent stopped successfully");
    }

    pub fn state(&self) -> AgentState { *self.core.lock_state() }

    pub async fn metrics(&self) -> AgentMetrics { self.core.model.lock().await.metrics.clone() }

    pub async fn predictions(&self) -> PredictionSnapshot {
        self.core.model.lock().await.trends.snapshot()
    }

    pub async fn optimizations(&self) -> Vec<ResourceOptimization> {
        self.core.model.lock().await.optimizations.clone()
    }

    pub fn subscribe<F>(&self, kind: AgentEventKind, handler: F) -> SubscriptionId
    where F: Fn(&AgentEvent) -> Result<(), HandlerError> + Send + Sync + 'static {
        self.core.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&self, kind: AgentEventKind, id: SubscriptionId) -> bool {
        self.core.bus.unsubscribe(kind, id)
    }
}

impl AgentCore {
    fn lock_state(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().expect("[FATAL] Mutex poisoned: Failed to acquire agent state")
    }

    fn lock_loop_tok(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.loop_tok.lock().expect("[FATAL] Mutex poisoned: Failed to acquire loop token")
    }

    fn is_running(&self) -> bool { *self.lock_state() == AgentState::Running }

    fn emit(&self, payload: AgentEventPayload) -> usize { self.bus.emit(&AgentEvent::new(payload)) }

    /// A run is live while its token is uncancelled and the agent is running.
    fn is_live(&self, c_tok: &CancellationToken) -> bool { !c_tok.is_cancelled() && self.is_running() }

    /// Emits only for a live run; a stopped or superseded run stays silent.
    fn emit_if_live(&self, payload: AgentEventPayload, c_tok: &CancellationToken) -> bool {
        if !self.is_live(c_tok) {
            event!("Supervisor run no longer live, dropping event.");
            return false;
        }
        self.emit(payload);
        true
    }

    fn emit_transition(&self, state: AgentState, previous: AgentState, message: &str) {
        if state == previous {
            return;
        }
        log!("Supervisor agent {previous} -> {state}: {message}");
        self.emit(AgentEventPayload::Status(StatusUpdate {
            state,
            previous: Some(previous),
            message: message.to_string(),
        }));
    }

    fn notify(&self, message: &str) {
        let state = *self.lock_state();
        self.emit(AgentEventPayload::Status(StatusUpdate {
            state,
            previous: None,
            message: message.to_string(),
        }));
    }

    fn set_state(&self, new: AgentState, message: &str) {
        let previous = std::mem::replace(&mut *self.lock_state(), new);
        self.emit_transition(new, previous, message);
    }

    /// Moves to the error state, disarms the loops and reports `e`.
    ///
    /// Ignored if the run owning `c_tok` was stopped or replaced while the
    /// failing pass was in flight.
    fn handle_error(&self, e: &AgentError, c_tok: &CancellationToken) {
        if !self.is_live(c_tok) {
            log!("Stale supervisor pass failed: {e}");
            return;
        }
        let message = e.to_string();
        error!("Supervisor agent failed: {message}");
        self.set_state(AgentState::Error, &message);
        self.cancel_loops();
        self.emit(AgentEventPayload::Error(ErrorReport { error: message }));
    }

    fn cancel_loops(&self) {
        if let Some(c_tok) = self.lock_loop_tok().take() {
            c_tok.cancel();
        }
    }

    /// Spawns the periodic loops of the run owning `c_tok`.
    ///
    /// # Returns
    /// `false` if the run was stopped before the loops could be armed.
    fn spawn_loops(self: &Arc<Self>, c_tok: CancellationToken) -> bool {
        if c_tok.is_cancelled() {
            return false;
        }
        let core = Arc::clone(self);
        tokio::spawn(async move { core.run_loops(c_tok).await });
        true
    }

    async fn run_loops(self: Arc<Self>, c_tok: CancellationToken) {
        let start = Instant::now();
        let monitor_dt = self.config.monitor_interval.max(MIN_PERIOD);
        let optimize_dt = self.config.optimization_interval.max(MIN_PERIOD);
        let mut monitor_tick = interval_at(start + monitor_dt, monitor_dt);
        let mut optimize_tick = interval_at(start + optimize_dt, optimize_dt);

        loop {
            tokio::select! {
                () = c_tok.cancelled() => break,
                _ = monitor_tick.tick() => {
                    if let Err(e) = self.monitor_system(&c_tok).await {
                        self.handle_error(&e, &c_tok);
                        break;
                    }
                }
                _ = optimize_tick.tick() => {
                    if self.is_live(&c_tok) {
                        self.adapt().await;
                    }
                }
            }
        }
        event!("Supervisor loops stopped.");
    }

    /// One monitoring pass of the run owning `c_tok`. Does nothing unless that run is live.
    async fn monitor_system(&self, c_tok: &CancellationToken) -> Result<(), AgentError> {
        if !self.is_live(c_tok) {
            return Ok(());
        }
        let status = self.source.fetch_status().await.ok_or(AgentError::StatusUnavailable)?;
        let tasks = self.source.fetch_tasks().await;
        let now = Utc::now();

        let mut outgoing = Vec::new();
        {
            let mut model = self.model.lock().await;

            let issues = analyze_health(&status.health);
            if !issues.is_empty() {
                for issue in &issues {
                    alert!("{} {} ({}): {}", issue.severity, issue.component, issue.status, issue.impact);
                }
                model.metrics.alerts_generated += 1;
                outgoing.push(AgentEventPayload::HealthAlert(HealthReport { issues }));
            }

            let update = model.anomalies.update(&status, now);
            if !update.raised.is_empty() {
                for anomaly in &update.raised {
                    alert!("{} {}: {}", anomaly.severity, anomaly.component, anomaly.description);
                }
                model.metrics.anomalies_detected += update.raised.len() as u64;
                model.metrics.alerts_generated += 1;
                outgoing.push(AgentEventPayload::AnomalyAlert(AnomalyReport { alerts: update.raised }));
            }
            for resolution in update.resolved {
                alert!("Anomaly {} resolved.", resolution.alert_id);
                model.metrics.alerts_resolved += 1;
                outgoing.push(AgentEventPayload::AlertResolved(resolution));
            }

            model.trends.observe(&status, now);

            let optimizations = suggest_optimizations(&status, &self.config);
            model.metrics.tasks_optimized += optimizations.len() as u64;
            model.optimizations.clone_from(&optimizations);
            outgoing.push(AgentEventPayload::ResourceOptimization(OptimizationReport { optimizations }));

            for task in &tasks {
                model.ledger.record(task);
            }
            let rate = model.ledger.success_rate();
            model.metrics.apply_success_rate(rate);
        }

        for payload in outgoing {
            self.emit_if_live(payload, c_tok);
        }
        Ok(())
    }

    async fn adapt(&self) {
        let mut model = self.model.lock().await;
        if let Some(accuracy) = model.trends.accuracy() {
            model.metrics.prediction_accuracy = accuracy;
        }
        model.metrics.learning_iterations += 1;
        model.metrics.adaptation_count += 1;
        model.metrics.last_adaptation = Utc::now();
        log!(
            "Supervisor adaptation #{}: prediction accuracy {:.3}, success rate {:.3} over {} tasks",
            model.metrics.adaptation_count,
            model.metrics.prediction_accuracy,
            model.metrics.mission_success_rate,
            model.ledger.recorded()
        );
    }
}
