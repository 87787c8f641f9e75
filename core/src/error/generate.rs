use thiserror::Error;

use super::error::LlmError;

/// Errors from the clean/validate/retry generation loop.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("model call failed: {0}")]
    Call(#[from] LlmError),

    #[error("generated content rejected: {0}")]
    Invalid(String),

    #[error("{operation} exhausted {attempts} attempts, last failure: {last}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last: String,
    },
}

impl GenerateError {
    /// True when no further attempts remain for the current step.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
