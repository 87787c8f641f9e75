use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::task::JoinHandle;

use super::context::{CancelToken, TaskContext};
use super::engine::ExecutionEngine;
use crate::error::ExecutorError;
use crate::generate::TaskDecomposer;
use crate::store::{ConversationTurn, TaskStore};
use crate::task::{TaskDecomposition, TaskExecutionResult};

struct RunningTask {
    task_id: String,
    cancel: CancelToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupervisorStatus {
    pub is_running: bool,
    pub current_task_id: Option<String>,
}

/// Caller-facing orchestration surface. Owns the one-task-at-a-time rule:
/// a second `execute` while a task runs is rejected, never queued. The
/// running task's future lives on its own tokio task so `cancel` and
/// `status` stay responsive.
pub struct TaskSupervisor {
    engine: Arc<ExecutionEngine>,
    decomposer: TaskDecomposer,
    tasks: Arc<dyn TaskStore>,
    running: Arc<Mutex<Option<RunningTask>>>,
}

impl TaskSupervisor {
    pub fn new(
        engine: Arc<ExecutionEngine>,
        decomposer: TaskDecomposer,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            engine,
            decomposer,
            tasks,
            running: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn decompose(
        &self,
        turns: &[ConversationTurn],
    ) -> Result<TaskDecomposition, ExecutorError> {
        self.decomposer
            .decompose(turns)
            .await
            .map_err(ExecutorError::Decomposition)
    }

    /// Start executing a decomposed plan. Returns the handle to the
    /// spawned run; the result is also recorded in the task store when
    /// the run finishes.
    pub fn execute(
        &self,
        task_id: impl Into<String>,
        plan: TaskDecomposition,
    ) -> Result<JoinHandle<TaskExecutionResult>, ExecutorError> {
        let task_id = task_id.into();
        if plan.steps.is_empty() {
            return Err(ExecutorError::InvalidPlan(
                "decomposition has no steps".to_string(),
            ));
        }

        let cancel = CancelToken::new();
        {
            let mut running = lock_or_recover(&self.running);
            if let Some(current) = &*running {
                return Err(ExecutorError::Busy {
                    current: current.task_id.clone(),
                });
            }
            *running = Some(RunningTask {
                task_id: task_id.clone(),
                cancel: cancel.clone(),
            });
        }

        let engine = Arc::clone(&self.engine);
        let tasks = Arc::clone(&self.tasks);
        let running = Arc::clone(&self.running);
        Ok(tokio::spawn(async move {
            let mut ctx = TaskContext::new(&task_id, cancel);
            let result = engine.execute(&mut ctx, &plan).await;
            tasks.record(&result).await;
            *lock_or_recover(&running) = None;
            result
        }))
    }

    /// Trip the cancellation token of the named task. Returns false when
    /// no task with that id is running.
    pub fn cancel(&self, task_id: &str) -> bool {
        let running = lock_or_recover(&self.running);
        match &*running {
            Some(current) if current.task_id == task_id => {
                current.cancel.cancel();
                tracing::info!(task_id, "cancellation requested");
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> SupervisorStatus {
        let running = lock_or_recover(&self.running);
        SupervisorStatus {
            is_running: running.is_some(),
            current_task_id: running.as_ref().map(|r| r.task_id.clone()),
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
