//! Core orchestration logic for deskpilot: task decomposition, operation
//! generation with validation and retry, visual grounding, and the
//! stepwise execution engine over a hybrid capability backend.

pub mod api;
pub mod automation;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod generate;
pub mod llm;
pub mod store;
pub mod task;
pub mod vision;

#[cfg(test)]
pub(crate) mod testutil;
