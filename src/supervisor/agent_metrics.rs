use crate::simulation::{MissionTask, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Counters and scores the agent accumulates while running.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub anomalies_detected: u64,
    pub alerts_generated: u64,
    pub alerts_resolved: u64,
    pub tasks_optimized: u64,
    pub learning_iterations: u64,
    pub adaptation_count: u64,
    pub last_adaptation: DateTime<Utc>,
    pub performance_score: f64,
    pub prediction_accuracy: f64,
    pub resource_efficiency: f64,
    pub mission_success_rate: f64,
}

impl AgentMetrics {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            anomalies_detected: 0,
            alerts_generated: 0,
            alerts_resolved: 0,
            tasks_optimized: 0,
            learning_iterations: 0,
            adaptation_count: 0,
            last_adaptation: now,
            performance_score: 0.0,
            prediction_accuracy: 0.0,
            resource_efficiency: 1.0,
            mission_success_rate: 0.0,
        }
    }

    pub fn apply_success_rate(&mut self, rate: f64) {
        self.mission_success_rate = rate;
        self.performance_score = (rate + self.resource_efficiency) / 2.0;
    }
}

/// Outcome per observed task id, bounded to the most recently first-seen ids.
///
/// Re-observing a known task overwrites its outcome without refreshing its age.
#[derive(Debug)]
pub struct MissionLedger {
    capacity: usize,
    outcomes: HashMap<String, bool>,
    order: VecDeque<String>,
}

impl Default for MissionLedger {
    fn default() -> Self { Self::with_capacity(Self::DEFAULT_CAPACITY) }
}

impl MissionLedger {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), outcomes: HashMap::new(), order: VecDeque::new() }
    }

    pub fn record(&mut self, task: &MissionTask) {
        let ok = task.status() == TaskStatus::Success;
        if self.outcomes.insert(task.id().to_string(), ok).is_none() {
            self.order.push_back(task.id().to_string());
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.outcomes.remove(&oldest);
            }
        }
    }

    /// Number of distinct task outcomes currently held.
    pub fn recorded(&self) -> usize { self.outcomes.len() }

    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let succeeded = self.outcomes.values().filter(|ok| **ok).count();
        succeeded as f64 / self.outcomes.len().max(1) as f64
    }
}
