//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `deskpilot_core::api` instead of reaching into
//! internal modules.

pub use crate::automation::{
    apply_file_operation, AppLauncher, CapabilityBackend, CapabilityProvider, OperationOutcome,
};
pub use crate::config::{
    get_data_dir, load_default, load_from, AppConfig, AutomationConfig, EventsConfig, LlmConfig,
    LoggingConfig, ModelEndpoint,
};
pub use crate::error::{CapabilityError, CliError, ExecutorError, GenerateError, LlmError};
pub use crate::events::{start_event_writer, EventKind, EventTx, ProgressEvent};
pub use crate::executor::{
    CancelToken, EngineOptions, ExecutionEngine, SupervisorStatus, TaskContext, TaskSupervisor,
};
pub use crate::generate::{
    ClickGenerator, FileGenerator, MessageIntent, MessageTriage, TaskDecomposer, TypeGenerator,
};
pub use crate::llm::{ChatModel, ChatRequest, ImageAttachment};
pub use crate::store::{ConversationStore, ConversationTurn, MemoryStore, TaskStore};
pub use crate::task::{
    ClickOperation, FileOperation, StepExecutionResult, StepKind, StepPlan, SuccessPolicy,
    TaskDecomposition, TaskExecutionResult, TaskState, TypeOperation,
};
pub use crate::vision::{DisplayCapture, VisionAnalyzer, VisualAnalysis};
