use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::High, TaskPriority::Medium, TaskPriority::Low];

    pub fn as_lowercase(self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

/// Execution outcome reported for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum TaskStatus {
    Success,
    Failed,
}

/// A simulated unit of mission work counting down towards completion.
///
/// The remaining duration is derived from the wall-clock time elapsed since
/// `start_time` and never increases, even if the clock jumps backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionTask {
    id: String,
    name: String,
    priority: TaskPriority,
    status: TaskStatus,
    start_time: DateTime<Utc>,
    total_duration_min: u32,
    remaining_min: u32,
}

impl MissionTask {
    const MINUTE: TimeDelta = TimeDelta::minutes(1);
    const PLACEHOLDER_DURATION_MIN: u32 = 60;

    pub fn new(
        id: String,
        name: String,
        priority: TaskPriority,
        status: TaskStatus,
        start_time: DateTime<Utc>,
        total_duration_min: u32,
    ) -> Self {
        Self {
            id,
            name,
            priority,
            status,
            start_time,
            total_duration_min,
            remaining_min: total_duration_min,
        }
    }

    /// Task reported while the simulator has no live task set.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self::new(
            String::from("1"),
            String::from("System Initialization"),
            TaskPriority::High,
            TaskStatus::Success,
            now,
            Self::PLACEHOLDER_DURATION_MIN,
        )
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn priority(&self) -> TaskPriority { self.priority }
    pub fn status(&self) -> TaskStatus { self.status }
    pub fn start_time(&self) -> DateTime<Utc> { self.start_time }
    pub fn total_duration_min(&self) -> u32 { self.total_duration_min }
    pub fn remaining_min(&self) -> u32 { self.remaining_min }
    pub fn is_complete(&self) -> bool { self.remaining_min == 0 }

    /// Recomputes the remaining minutes at `now` (rounded up to whole minutes).
    ///
    /// # Returns
    /// `true` once the task has no time left.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let minute_ms = Self::MINUTE.num_milliseconds();
        let total_ms = i64::from(self.total_duration_min) * minute_ms;
        let elapsed_ms = (now - self.start_time).num_milliseconds().max(0);
        let remaining_ms = (total_ms - elapsed_ms).max(0);
        let remaining = u32::try_from((remaining_ms + minute_ms - 1) / minute_ms)
            .unwrap_or(self.total_duration_min);
        self.remaining_min = self.remaining_min.min(remaining);
        self.is_complete()
    }
}

impl Display for MissionTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}/{} min left ({})",
            self.name, self.priority, self.remaining_min, self.total_duration_min, self.id
        )
    }
}

/// Lightweight reference to the task that was active when a sample was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    pub name: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub remaining_min: u32,
}

impl From<&MissionTask> for TaskRef {
    fn from(task: &MissionTask) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            priority: task.priority,
            status: task.status,
            remaining_min: task.remaining_min,
        }
    }
}
