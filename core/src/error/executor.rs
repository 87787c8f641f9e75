use thiserror::Error;

use super::generate::GenerateError;

/// Executor-specific errors for task admission and plan handling.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Task '{current}' is already running, one task at a time")]
    Busy { current: String },

    #[error("Decomposition failed: {0}")]
    Decomposition(#[from] GenerateError),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

impl ExecutorError {
    /// Busy rejections are transient and safe to retry once the running
    /// task finishes; everything else needs a new decomposition.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}
