use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::vision::GroundingSession;

/// Cooperative cancellation flag. The engine polls it at step boundaries
/// only; an in-flight model or capability call always runs to its own
/// timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// State scoped to one running task: its id, its cancellation token, and
/// the display pin. Created when the task starts and dropped with it, so
/// nothing leaks across tasks.
#[derive(Debug)]
pub struct TaskContext {
    pub task_id: String,
    pub cancel: CancelToken,
    pub grounding: GroundingSession,
}

impl TaskContext {
    pub fn new(task_id: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            task_id: task_id.into(),
            cancel,
            grounding: GroundingSession::new(),
        }
    }
}
