//! Stepwise task execution.
//!
//! The engine takes a `TaskDecomposition` and walks its steps strictly in
//! plan order:
//!
//! ```text
//! TaskDecomposition
//!   ↓ per step
//! cancellation check → visual grounding (if requested) → generator →
//! capability backend → StepExecutionResult
//!   ↓
//! TaskExecutionResult (state + success per SuccessPolicy)
//! ```
//!
//! A required step failing aborts the task; optional steps are skipped
//! and counted. `TaskSupervisor` sits on top and enforces one task at a
//! time with cooperative cancellation at step boundaries.

mod context;
mod engine;
mod extract;
mod supervisor;

pub use context::{CancelToken, TaskContext};
pub use engine::{EngineOptions, ExecutionEngine};
pub use supervisor::{SupervisorStatus, TaskSupervisor};
