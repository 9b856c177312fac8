#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod advisor;
mod config;
mod event_bus;
mod logger;
mod simulation;
mod supervisor;

use crate::advisor::{AdvisorQuery, HttpAdvisor, MissionAdvisor};
use crate::config::MissionConfig;
use crate::event_bus::{BusEvent, HandlerError};
use crate::simulation::TelemetrySimulator;
use crate::supervisor::{AgentEventKind, AgentEventPayload, AgentState, SupervisorAgent};
use std::{env, sync::Arc, time::Duration};

const DASHBOARD_PERIOD: Duration = Duration::from_secs(10);

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = MissionConfig::from_env();
    let args: Vec<String> = env::args().skip(1).collect();
    match args.split_first() {
        Some((cmd, rest)) if cmd == "ask" => ask(&config, &rest.join(" ")).await,
        _ => run_mission(&config).await,
    }
}

async fn ask(config: &MissionConfig, text: &str) {
    let query = match AdvisorQuery::new(text) {
        Ok(q) => q,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    let advisor = HttpAdvisor::new(&config.advisor)
        .unwrap_or_else(|e| fatal!("Could not build advisor client: {e}"));
    match advisor.ask(&query).await {
        Ok(answer) => println!("{answer}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

async fn run_mission(config: &MissionConfig) {
    let sim = TelemetrySimulator::new(config.simulation.clone());
    let agent = SupervisorAgent::new(config.agent.clone(), Arc::new(sim.clone()));
    subscribe_console(&agent);

    if let Err(e) = agent.start().await {
        fatal!("Supervisor agent failed to start: {e}");
    }

    let mut dashboard = tokio::time::interval(DASHBOARD_PERIOD);
    loop {
        tokio::select! {
            _ = dashboard.tick() => {
                print_dashboard(&sim, &agent).await;
                if agent.state() == AgentState::Error {
                    warn!("Supervisor agent in error state, restarting.");
                    if let Err(e) = agent.start().await {
                        error!("Supervisor restart failed: {e}");
                    }
                }
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!("Could not listen for shutdown signal: {e}");
                }
                break;
            }
        }
    }

    agent.stop();
    sim.shutdown();
    info!("Mission control shut down.");
}

fn subscribe_console(agent: &SupervisorAgent) {
    agent.subscribe(AgentEventKind::Status, |e| {
        let AgentEventPayload::Status(update) = &e.payload else {
            return Err(HandlerError::new(format!("Status handler got {} payload", e.kind())));
        };
        event!("Agent status {}: {}", update.state, update.message);
        Ok(())
    });
    agent.subscribe(AgentEventKind::Error, |e| {
        let AgentEventPayload::Error(report) = &e.payload else {
            return Err(HandlerError::new(format!("Error handler got {} payload", e.kind())));
        };
        error!("Agent reported: {}", report.error);
        Ok(())
    });
    agent.subscribe(AgentEventKind::ResourceOptimization, |e| {
        let AgentEventPayload::ResourceOptimization(report) = &e.payload else {
            return Err(HandlerError::new(format!("Advisory handler got {} payload", e.kind())));
        };
        for opt in &report.optimizations {
            log!(
                "Advisory [{}] {}: {:.1} -> {:.1} (saves {:.1})",
                opt.priority,
                opt.resource_type,
                opt.current_usage,
                opt.recommended_usage,
                opt.potential_savings
            );
        }
        Ok(())
    });
    // findings are printed by the agent via alert!, this only traces delivery
    for kind in [AgentEventKind::HealthAlert, AgentEventKind::AnomalyAlert, AgentEventKind::AlertResolved] {
        agent.subscribe(kind, |e| {
            event!("Delivered {} event stamped {}", e.kind(), e.timestamp.format("%H:%M:%S"));
            Ok(())
        });
    }
}

#[allow(clippy::cast_precision_loss)]
async fn print_dashboard(sim: &TelemetrySimulator, agent: &SupervisorAgent) {
    let status = sim.latest_status().await;
    let stamp = sim.last_update().await.map_or_else(|| String::from("never"), |t| t.format("%H:%M:%S").to_string());
    info!(
        "Battery {:.1}% | Power {:.1} W | Storage {:.0} MB | Bandwidth {:.1} Mbps | Ground station {} | Updated {stamp}",
        status.power.battery_level_pct,
        status.power.consumption_w,
        status.storage_mb,
        status.bandwidth_mbps,
        status.ground_station
    );
    for task in sim.active_tasks().await {
        log!("Task {task}");
    }

    let links = sim.coordination_snapshot().await;
    let mean_util = links.iter().map(|l| l.utilization).sum::<f64>() / links.len().max(1) as f64;
    log!("{} satellite links, mean utilization {mean_util:.2}", links.len());

    for p in agent.predictions().await.predictions {
        event!("Predicted {}: {:.1} (confidence {:.2})", p.metric, p.value, p.confidence);
    }
    let m = agent.metrics().await;
    log!(
        "Agent {} | score {:.2} | success {:.2} | accuracy {:.2} | anomalies {} | alerts {}/{} resolved",
        agent.state(),
        m.performance_score,
        m.mission_success_rate,
        m.prediction_accuracy,
        m.anomalies_detected,
        m.alerts_resolved,
        m.alerts_generated
    );
}
