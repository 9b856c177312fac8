use super::{
    AdvisoryPriority, AgentError, AgentEvent, AgentEventKind, AgentEventPayload, AgentState,
    AnomalyMonitor, MissionDataSource, MissionLedger, Metric, ResourceKind, Severity, Subsystem,
    SupervisorAgent, TrendModel, analyze_health, predict, suggest_optimizations,
};
use crate::{
    config::{AgentConfig, SimulationConfig},
    event_bus::BusEvent,
    simulation::{
        CommunicationHealth, MissionTask, PropulsionHealth, SimulationError, SubsystemHealth,
        SystemStatus, TaskPriority, TaskStatus, TelemetrySimulator, ThermalHealth,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::oneshot;

const HOUR: Duration = Duration::from_secs(3600);

struct StubSource {
    ready: Result<(), SimulationError>,
    status: Mutex<Option<SystemStatus>>,
    tasks: Mutex<Vec<MissionTask>>,
}

impl StubSource {
    fn with_status(status: SystemStatus) -> Arc<Self> {
        Arc::new(Self {
            ready: Ok(()),
            status: Mutex::new(Some(status)),
            tasks: Mutex::new(Vec::new()),
        })
    }

    fn set_status(&self, status: Option<SystemStatus>) { *self.status.lock().unwrap() = status; }
}

#[async_trait]
impl MissionDataSource for StubSource {
    async fn ensure_ready(&self) -> Result<(), SimulationError> { self.ready.clone() }

    async fn fetch_status(&self) -> Option<SystemStatus> { self.status.lock().unwrap().clone() }

    async fn fetch_tasks(&self) -> Vec<MissionTask> { self.tasks.lock().unwrap().clone() }
}

type Gate = (oneshot::Sender<()>, oneshot::Receiver<Option<SystemStatus>>);

/// Source whose next status fetch parks until the test releases it.
struct GatedSource {
    status: Mutex<Option<SystemStatus>>,
    gate: Mutex<Option<Gate>>,
}

impl GatedSource {
    fn with_status(status: SystemStatus) -> Arc<Self> {
        Arc::new(Self { status: Mutex::new(Some(status)), gate: Mutex::new(None) })
    }

    /// Returns a receiver firing once the fetch is parked and the sender that releases it.
    fn hold_next_fetch(&self) -> (oneshot::Receiver<()>, oneshot::Sender<Option<SystemStatus>>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }
}

#[async_trait]
impl MissionDataSource for GatedSource {
    async fn ensure_ready(&self) -> Result<(), SimulationError> { Ok(()) }

    async fn fetch_status(&self) -> Option<SystemStatus> {
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.send(()).unwrap();
            return release.await.ok().flatten();
        }
        self.status.lock().unwrap().clone()
    }

    async fn fetch_tasks(&self) -> Vec<MissionTask> { Vec::new() }
}

fn status_with(edit: impl FnOnce(&mut SystemStatus)) -> SystemStatus {
    let mut status = SystemStatus::default();
    edit(&mut status);
    status
}

fn agent_config() -> AgentConfig {
    AgentConfig { optimization_interval: HOUR, ..AgentConfig::default() }
}

type EventLog = Arc<Mutex<Vec<AgentEvent>>>;

fn record_all(agent: &SupervisorAgent) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    for kind in AgentEventKind::ALL {
        let log = Arc::clone(&log);
        agent.subscribe(kind, move |e| {
            log.lock().unwrap().push(e.clone());
            Ok(())
        });
    }
    log
}

fn of_kind(log: &EventLog, kind: AgentEventKind) -> Vec<AgentEvent> {
    log.lock().unwrap().iter().filter(|e| e.kind() == kind).cloned().collect()
}

fn transitions_to(log: &EventLog, state: AgentState) -> usize {
    of_kind(log, AgentEventKind::Status)
        .iter()
        .filter(|e| matches!(&e.payload, AgentEventPayload::Status(s) if s.is_transition() && s.state == state))
        .count()
}

fn task(id: &str, status: TaskStatus) -> MissionTask {
    MissionTask::new(
        id.to_string(),
        String::from("Titan Atmospheric Analysis"),
        TaskPriority::High,
        status,
        Utc::now(),
        60,
    )
}

#[test]
fn test_health_rules_follow_rule_order() {
    assert!(analyze_health(&SubsystemHealth::NOMINAL).is_empty());

    let failing = SubsystemHealth {
        thermal: ThermalHealth::Warning,
        propulsion: PropulsionHealth::Degraded,
        communication: CommunicationHealth::Intermittent,
        ..SubsystemHealth::NOMINAL
    };
    let issues = analyze_health(&failing);
    let summary: Vec<_> = issues.iter().map(|i| (i.component, i.severity)).collect();
    assert_eq!(summary, vec![
        (Subsystem::Propulsion, Severity::High),
        (Subsystem::ThermalControl, Severity::Medium),
        (Subsystem::Communication, Severity::High),
    ]);
    assert_eq!(issues[1].status, "Warning");
    assert!(issues.iter().all(|i| i.recommendations.len() == 4));
}

#[test]
fn test_trend_prediction() {
    let p = predict(&[10.0, 12.0, 14.0], 16.0);
    assert!((p.value - 18.0).abs() < 1e-9);
    let variance = (8.0_f64.powi(2) + 10.0_f64.powi(2) + 12.0_f64.powi(2)) / 3.0;
    assert!((p.confidence - 1.0 / (1.0 + variance.sqrt())).abs() < 1e-12);

    let short = predict(&[10.0], 42.0);
    assert!((short.value - 42.0).abs() < f64::EPSILON);
    assert!((short.confidence - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_trend_model_scores_previous_predictions() {
    let mut model = TrendModel::new(10);
    assert!(model.accuracy().is_none());
    for storage in [10.0, 12.0, 14.0] {
        model.observe(&status_with(|s| s.storage_mb = storage), Utc::now());
    }
    let storage = model.prediction(Metric::Storage).unwrap();
    assert!((storage.value - 16.0).abs() < 1e-9);

    model.observe(&status_with(|s| s.storage_mb = 20.0), Utc::now());
    // storage scored 5/6, 6/7 and 4/5; power and bandwidth never moved
    let expected = (5.0 / 6.0 + 6.0 / 7.0 + 0.8 + 6.0) / 9.0;
    assert!((model.accuracy().unwrap() - expected).abs() < 1e-9);
    assert_eq!(model.snapshot().predictions.len(), 3);
}

#[test]
fn test_trend_history_is_capped() {
    let mut model = TrendModel::new(3);
    for power in [100.0, 100.0, 100.0, 110.0, 120.0, 130.0] {
        model.observe(&status_with(|s| s.power.consumption_w = power), Utc::now());
    }
    // the last prediction only saw [100, 110, 120]
    let power = model.prediction(Metric::Power).unwrap();
    assert!((power.value - 140.0).abs() < 1e-9);
}

#[test]
fn test_optimizer_priorities() {
    let cfg = AgentConfig::default();
    assert!(suggest_optimizations(&SystemStatus::default(), &cfg).is_empty());

    let medium = suggest_optimizations(&status_with(|s| s.power.battery_level_pct = 60.0), &cfg);
    assert_eq!(medium.len(), 1);
    assert_eq!(medium[0].priority, AdvisoryPriority::Medium);
    assert!((medium[0].recommended_usage - 120.0).abs() < 1e-9);
    assert!((medium[0].potential_savings - 30.0).abs() < 1e-9);
}

#[test]
fn test_anomaly_monitor_raises_once_and_resolves() {
    let mut monitor = AnomalyMonitor::new(20.0);
    let low = status_with(|s| s.power.battery_level_pct = 12.0);

    let first = monitor.update(&low, Utc::now());
    assert_eq!(first.raised.len(), 1);
    assert!(monitor.update(&low, Utc::now()).raised.is_empty());

    let coded = status_with(|s| s.anomaly_id = Some(42));
    let next = monitor.update(&coded, Utc::now());
    assert_eq!(next.raised.len(), 1);
    assert_eq!(next.raised[0].severity, Severity::Medium);
    assert_eq!(next.resolved.len(), 1);
    assert_eq!(next.resolved[0].alert_id, AnomalyMonitor::POWER_CRITICAL_ID);
    assert_eq!(monitor.active().count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_emits_one_running_transition() {
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(SystemStatus::default()));
    let log = record_all(&agent);

    agent.start().await.unwrap();
    agent.start().await.unwrap();

    assert_eq!(agent.state(), AgentState::Running);
    assert_eq!(transitions_to(&log, AgentState::Running), 1);
    let running: Vec<_> = of_kind(&log, AgentEventKind::Status)
        .into_iter()
        .filter_map(|e| match e.payload {
            AgentEventPayload::Status(s) if s.state == AgentState::Running => Some(s.message),
            _ => None,
        })
        .collect();
    assert_eq!(running, vec!["Starting agent...", "Agent is already running"]);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_fresh_agent_reports_zero_scores() {
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(SystemStatus::default()));

    let metrics = agent.metrics().await;
    assert!(metrics.mission_success_rate.abs() < f64::EPSILON);
    assert!(metrics.performance_score.abs() < f64::EPSILON);
    assert!(metrics.prediction_accuracy.abs() < f64::EPSILON);
    assert_eq!(metrics.adaptation_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_handler_is_not_called() {
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(SystemStatus::default()));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = agent.subscribe(AgentEventKind::ResourceOptimization, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let log = record_all(&agent);

    assert!(agent.unsubscribe(AgentEventKind::ResourceOptimization, id));
    assert!(!agent.unsubscribe(AgentEventKind::ResourceOptimization, id));
    agent.start().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(of_kind(&log, AgentEventKind::ResourceOptimization).len(), 1);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_pass_drops_its_findings() {
    let source = GatedSource::with_status(SystemStatus::default());
    let (entered, release) = source.hold_next_fetch();
    let agent = SupervisorAgent::new(agent_config(), Arc::clone(&source) as Arc<dyn MissionDataSource>);
    let log = record_all(&agent);

    let runner = agent.clone();
    let pass = tokio::spawn(async move { runner.start().await });
    entered.await.unwrap();
    agent.stop();
    let degraded = status_with(|s| {
        s.health.propulsion = PropulsionHealth::Degraded;
        s.power.battery_level_pct = 40.0;
    });
    release.send(Some(degraded)).unwrap();

    assert_eq!(pass.await.unwrap(), Ok(()));
    assert_eq!(agent.state(), AgentState::Idle);
    assert!(of_kind(&log, AgentEventKind::HealthAlert).is_empty());
    assert!(of_kind(&log, AgentEventKind::ResourceOptimization).is_empty());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(of_kind(&log, AgentEventKind::ResourceOptimization).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_pass_failure_spares_restarted_run() {
    let source = GatedSource::with_status(SystemStatus::default());
    let (entered, release) = source.hold_next_fetch();
    let agent = SupervisorAgent::new(agent_config(), Arc::clone(&source) as Arc<dyn MissionDataSource>);
    let log = record_all(&agent);

    let runner = agent.clone();
    let stale = tokio::spawn(async move { runner.start().await });
    entered.await.unwrap();
    agent.stop();
    agent.start().await.unwrap();
    release.send(None).unwrap();

    assert_eq!(stale.await.unwrap(), Err(AgentError::StatusUnavailable));
    assert_eq!(agent.state(), AgentState::Running);
    assert!(of_kind(&log, AgentEventKind::Error).is_empty());
    assert_eq!(transitions_to(&log, AgentState::Error), 0);

    tokio::time::sleep(Duration::from_secs(4)).await;
    // restarted run: immediate pass plus the tick at 3 s
    assert_eq!(of_kind(&log, AgentEventKind::ResourceOptimization).len(), 2);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_when_idle_is_a_notice() {
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(SystemStatus::default()));
    let log = record_all(&agent);

    agent.stop();

    let status = of_kind(&log, AgentEventKind::Status);
    assert_eq!(status.len(), 1);
    assert!(matches!(&status[0].payload, AgentEventPayload::Status(s) if !s.is_transition() && s.state == AgentState::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_degraded_propulsion_raises_single_alert() {
    let status = status_with(|s| s.health.propulsion = PropulsionHealth::Degraded);
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(status));
    let log = record_all(&agent);

    agent.start().await.unwrap();

    let alerts = of_kind(&log, AgentEventKind::HealthAlert);
    assert_eq!(alerts.len(), 1);
    let AgentEventPayload::HealthAlert(report) = &alerts[0].payload else {
        panic!("unexpected payload {:?}", alerts[0].payload);
    };
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].component, Subsystem::Propulsion);
    assert_eq!(report.issues[0].severity, Severity::High);
    assert_eq!(agent.metrics().await.alerts_generated, 1);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_low_battery_and_full_storage_suggestions() {
    let status = status_with(|s| {
        s.power.battery_level_pct = 40.0;
        s.power.consumption_w = 200.0;
        s.storage_mb = 9000.0;
    });
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(status));
    let log = record_all(&agent);

    agent.start().await.unwrap();

    let reports = of_kind(&log, AgentEventKind::ResourceOptimization);
    assert_eq!(reports.len(), 1);
    let AgentEventPayload::ResourceOptimization(report) = &reports[0].payload else {
        panic!("unexpected payload {:?}", reports[0].payload);
    };
    let opts = &report.optimizations;
    assert_eq!(opts.len(), 2);
    assert_eq!((opts[0].resource_type, opts[0].priority), (ResourceKind::Power, AdvisoryPriority::High));
    assert!((opts[0].recommended_usage - 160.0).abs() < 1e-9);
    assert_eq!((opts[1].resource_type, opts[1].priority), (ResourceKind::Storage, AdvisoryPriority::High));
    assert!((opts[1].recommended_usage - 6400.0).abs() < 1e-9);
    assert!((opts[1].potential_savings - 2600.0).abs() < 1e-9);
    assert_eq!(&agent.optimizations().await, opts);
    assert_eq!(agent.metrics().await.tasks_optimized, 2);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_silences_timers() {
    let agent = SupervisorAgent::new(agent_config(), StubSource::with_status(SystemStatus::default()));
    let log = record_all(&agent);

    agent.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(7)).await;
    // immediate pass plus ticks at 3 s and 6 s
    assert_eq!(of_kind(&log, AgentEventKind::ResourceOptimization).len(), 3);

    agent.stop();
    let seen = log.lock().unwrap().len();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(log.lock().unwrap().len(), seen);
    assert_eq!(agent.state(), AgentState::Idle);
    assert_eq!(transitions_to(&log, AgentState::Idle), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_status_fails_start() {
    let source = StubSource::with_status(SystemStatus::default());
    source.set_status(None);
    let agent = SupervisorAgent::new(agent_config(), Arc::clone(&source) as Arc<dyn MissionDataSource>);
    let log = record_all(&agent);

    assert_eq!(agent.start().await, Err(AgentError::StatusUnavailable));
    assert_eq!(agent.state(), AgentState::Error);
    assert_eq!(of_kind(&log, AgentEventKind::Error).len(), 1);
    assert_eq!(transitions_to(&log, AgentState::Error), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(of_kind(&log, AgentEventKind::ResourceOptimization).is_empty());

    source.set_status(Some(SystemStatus::default()));
    agent.start().await.unwrap();
    assert_eq!(agent.state(), AgentState::Running);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_source_not_ready_fails_start() {
    let source = Arc::new(StubSource {
        ready: Err(SimulationError::EmptyCatalog("task names")),
        status: Mutex::new(Some(SystemStatus::default())),
        tasks: Mutex::new(Vec::new()),
    });
    let agent = SupervisorAgent::new(agent_config(), source);
    let log = record_all(&agent);

    let err = agent.start().await.unwrap_err();
    assert!(matches!(err, AgentError::SourceUnavailable(SimulationError::EmptyCatalog(_))));
    assert_eq!(agent.state(), AgentState::Error);
    assert_eq!(of_kind(&log, AgentEventKind::Error).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_during_loop_is_fatal() {
    let source = StubSource::with_status(SystemStatus::default());
    let agent = SupervisorAgent::new(agent_config(), Arc::clone(&source) as Arc<dyn MissionDataSource>);
    let log = record_all(&agent);

    agent.start().await.unwrap();
    source.set_status(None);
    tokio::time::sleep(Duration::from_secs(4)).await;

    assert_eq!(agent.state(), AgentState::Error);
    assert_eq!(of_kind(&log, AgentEventKind::Error).len(), 1);
    let seen = log.lock().unwrap().len();

    source.set_status(Some(SystemStatus::default()));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(log.lock().unwrap().len(), seen);
}

#[tokio::test(start_paused = true)]
async fn test_anomaly_raised_then_resolved() {
    let source = StubSource::with_status(status_with(|s| s.power.battery_level_pct = 15.0));
    let agent = SupervisorAgent::new(agent_config(), Arc::clone(&source) as Arc<dyn MissionDataSource>);
    let log = record_all(&agent);

    agent.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;

    let raised = of_kind(&log, AgentEventKind::AnomalyAlert);
    assert_eq!(raised.len(), 1);
    let AgentEventPayload::AnomalyAlert(report) = &raised[0].payload else {
        panic!("unexpected payload {:?}", raised[0].payload);
    };
    assert_eq!(report.alerts.len(), 1);
    let alert = &report.alerts[0];
    assert_eq!((alert.component, alert.severity), (Subsystem::Power, Severity::Critical));
    assert_eq!(alert.value, Some(15.0));
    assert_eq!(alert.threshold, Some(20.0));

    source.set_status(Some(SystemStatus::default()));
    tokio::time::sleep(Duration::from_secs(3)).await;

    let resolved = of_kind(&log, AgentEventKind::AlertResolved);
    assert_eq!(resolved.len(), 1);
    let AgentEventPayload::AlertResolved(resolution) = &resolved[0].payload else {
        panic!("unexpected payload {:?}", resolved[0].payload);
    };
    assert_eq!(resolution.alert_id, AnomalyMonitor::POWER_CRITICAL_ID);
    assert_eq!(resolution.status, "resolved");

    let metrics = agent.metrics().await;
    assert_eq!(metrics.anomalies_detected, 1);
    assert_eq!(metrics.alerts_resolved, 1);
    agent.stop();
}

#[tokio::test(start_paused = true)]
async fn test_mission_success_rate() {
    let source = StubSource::with_status(SystemStatus::default());
    *source.tasks.lock().unwrap() = vec![
        task("a", TaskStatus::Success),
        task("b", TaskStatus::Success),
        task("c", TaskStatus::Failed),
        task("d", TaskStatus::Success),
    ];
    let agent = SupervisorAgent::new(agent_config(), source);

    agent.start().await.unwrap();

    let metrics = agent.metrics().await;
    assert!((metrics.mission_success_rate - 0.75).abs() < 1e-9);
    assert!((metrics.performance_score - 0.875).abs() < 1e-9);
    agent.stop();
}

#[test]
fn test_ledger_keeps_most_recent_tasks() {
    let mut ledger = MissionLedger::with_capacity(3);
    for (id, status) in [
        ("a", TaskStatus::Success),
        ("b", TaskStatus::Failed),
        ("c", TaskStatus::Success),
        ("d", TaskStatus::Success),
        ("e", TaskStatus::Failed),
    ] {
        ledger.record(&task(id, status));
    }
    assert_eq!(ledger.recorded(), 3);
    assert!((ledger.success_rate() - 2.0 / 3.0).abs() < 1e-9);

    ledger.record(&task("e", TaskStatus::Success));
    assert_eq!(ledger.recorded(), 3);
    assert!((ledger.success_rate() - 1.0).abs() < 1e-9);

    // "c" is still the oldest and goes first
    ledger.record(&task("f", TaskStatus::Failed));
    assert_eq!(ledger.recorded(), 3);
    assert!((ledger.success_rate() - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_adaptation_tick() {
    let config = AgentConfig { optimization_interval: Duration::from_secs(10), ..AgentConfig::default() };
    let agent = SupervisorAgent::new(config, StubSource::with_status(SystemStatus::default()));

    agent.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;

    let metrics = agent.metrics().await;
    assert_eq!(metrics.learning_iterations, 1);
    assert_eq!(metrics.adaptation_count, 1);
    assert!((metrics.prediction_accuracy - 1.0).abs() < 1e-9);
    assert_eq!(agent.predictions().await.predictions.len(), 3);

    agent.stop();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(agent.metrics().await.adaptation_count, 1);
}

#[tokio::test]
async fn test_supervises_simulator() {
    let sim_config = SimulationConfig {
        tick_interval: HOUR,
        regeneration_interval: HOUR,
        error_reset_interval: HOUR,
        seed: Some(3),
        ..SimulationConfig::default()
    };
    let sim = TelemetrySimulator::new(sim_config);
    let agent = SupervisorAgent::new(agent_config(), Arc::new(sim.clone()));
    let log = record_all(&agent);

    agent.start().await.unwrap();

    assert!(sim.is_initialized());
    assert_eq!(of_kind(&log, AgentEventKind::ResourceOptimization).len(), 1);
    let rate = agent.metrics().await.mission_success_rate;
    assert!((0.0..=1.0).contains(&rate));
    agent.stop();
    sim.shutdown();
}
