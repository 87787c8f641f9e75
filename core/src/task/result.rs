use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::StepKind;

/// Task lifecycle. `Cancelled` is a first-class outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Outcome of one executed step. Immutable once appended to the task
/// result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionResult {
    pub step_index: usize,
    pub step_type: StepKind,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
}

impl StepExecutionResult {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Tolerance band deciding task success when optional steps failed.
/// A task with zero errors always succeeds; otherwise the success rate
/// and error count both have to stay inside the band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SuccessPolicy {
    pub min_success_rate: f64,
    pub max_errors: usize,
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        Self {
            min_success_rate: 0.8,
            max_errors: 2,
        }
    }
}

impl SuccessPolicy {
    pub fn is_success(&self, error_count: usize, success_rate: f64) -> bool {
        error_count == 0
            || (success_rate >= self.min_success_rate && error_count <= self.max_errors)
    }
}

/// Aggregated outcome of one task run. Step results accumulate in plan
/// order; statistics are computed once when the run reaches a terminal
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecutionResult {
    pub task_id: String,
    pub state: TaskState,
    pub success: bool,
    pub steps: Vec<StepExecutionResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error_count: usize,
    pub success_rate: f64,
    #[serde(default)]
    pub message: String,
}

impl TaskExecutionResult {
    pub fn started(task_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            state: TaskState::Running,
            success: false,
            steps: Vec::new(),
            started_at: now,
            finished_at: now,
            error_count: 0,
            success_rate: 0.0,
            message: String::new(),
        }
    }

    pub fn record_step(&mut self, step: StepExecutionResult) {
        self.steps.push(step);
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.len()
    }

    /// Close the run: fix the terminal state, compute the error count and
    /// success rate over the executed steps, and apply `policy`. Failed
    /// and cancelled runs are never successful regardless of the band.
    pub fn finalize(&mut self, state: TaskState, policy: &SuccessPolicy) {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.finished_at = Utc::now();
        self.error_count = self.steps.iter().filter(|s| !s.success).count();
        self.success_rate = if self.steps.is_empty() {
            1.0
        } else {
            let successful = self.steps.len() - self.error_count;
            successful as f64 / self.steps.len() as f64
        };
        self.success = match state {
            TaskState::Completed => policy.is_success(self.error_count, self.success_rate),
            _ => false,
        };
    }
}
