//! Task data model: the decomposed plan produced by stage one, the
//! concrete operations produced by stage two, and the execution results
//! accumulated by the engine.

pub mod operation;
pub mod plan;
pub mod result;

pub use operation::{ClickOperation, FileAction, FileOperation, MouseButton, TypeOperation};
pub use plan::{RiskLevel, StepKind, StepPlan, TaskComplexity, TaskDecomposition};
pub use result::{StepExecutionResult, SuccessPolicy, TaskExecutionResult, TaskState};
