use std::sync::Arc;

use anyhow::Result;

use deskpilot_core::automation::{CapabilityBackend, CapabilityProvider};
use deskpilot_core::config::AppConfig;
use deskpilot_core::error::CapabilityError;
use deskpilot_core::events::EventTx;
use deskpilot_core::executor::{EngineOptions, ExecutionEngine, TaskSupervisor};
use deskpilot_core::generate::TaskDecomposer;
use deskpilot_core::llm::ChatModel;
use deskpilot_core::store::{MemoryStore, TaskStore};

use crate::backend::{NativeProvider, WorkerProvider};
use crate::llm::HttpChatModel;

/// Text and vision clients for the configured endpoints, in that order.
pub fn build_chat_models(cfg: &AppConfig) -> Result<(Arc<dyn ChatModel>, Arc<dyn ChatModel>)> {
    let text: Arc<dyn ChatModel> = Arc::new(HttpChatModel::text(&cfg.llm)?);
    let vision: Arc<dyn ChatModel> = Arc::new(HttpChatModel::vision(&cfg.llm)?);
    Ok((text, vision))
}

/// Hybrid capability backend: the native provider plus the external
/// worker, ordered by `automation.prefer_native`. Fails when neither
/// provider probes available.
pub async fn build_backend(cfg: &AppConfig) -> Result<Arc<CapabilityBackend>, CapabilityError> {
    let native: Arc<dyn CapabilityProvider> = Arc::new(NativeProvider::new());
    let worker: Arc<dyn CapabilityProvider> = Arc::new(WorkerProvider::discover(
        &cfg.automation.worker_paths,
        cfg.automation.worker_timeout_ms,
    ));
    let backend =
        CapabilityBackend::new(Some(native), Some(worker), cfg.automation.prefer_native).await?;
    Ok(Arc::new(backend))
}

/// In-memory conversation and task store shared by the CLI session.
pub fn build_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// The fully wired supervisor. Models come in from the caller so the
/// shell can reuse them for triage without a second HTTP client.
pub async fn build_supervisor(
    cfg: &AppConfig,
    text: Arc<dyn ChatModel>,
    vision: Arc<dyn ChatModel>,
    events: Option<EventTx>,
    tasks: Arc<dyn TaskStore>,
) -> Result<TaskSupervisor> {
    let backend = build_backend(cfg).await?;
    let decomposer = TaskDecomposer::new(Arc::clone(&text), cfg.llm.max_attempts);
    let engine = Arc::new(ExecutionEngine::new(
        backend,
        text,
        vision,
        events,
        EngineOptions::from_config(cfg),
    ));
    Ok(TaskSupervisor::new(engine, decomposer, tasks))
}
