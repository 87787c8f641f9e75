use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress event kinds, emitted in step order per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskStarted,
    StepStarted,
    StepCompleted,
    StepSkipped,
    StepFailed,
    TaskCompleted,
    TaskFailed,
    TaskCancelled,
}

/// One best-effort progress notification. Delivery may be dropped under
/// backpressure; consumers must not treat events as a reliable ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn task(kind: EventKind, task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            task_id: task_id.into(),
            step_index: None,
            message: message.into(),
            data: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn step(
        kind: EventKind,
        task_id: impl Into<String>,
        step_index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step_index: Some(step_index),
            ..Self::task(kind, task_id, message)
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
