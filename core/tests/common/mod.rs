//! Shared doubles for the end-to-end tests: a scripted chat model that
//! keeps every request it saw, a desktop simulator provider, and a
//! harness wiring both into a supervisor.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use deskpilot_core::api::{
    CapabilityBackend, CapabilityProvider, ChatModel, ChatRequest, EngineOptions,
    ExecutionEngine, MemoryStore, OperationOutcome, SuccessPolicy, TaskDecomposer,
    TaskSupervisor,
};
use deskpilot_core::error::{CapabilityError, LlmError};
use deskpilot_core::task::MouseButton;
use deskpilot_core::vision::{DisplayCapture, Region};

/// Chat model replaying a scripted sequence of answers, then failing
/// with an empty response. Requests are recorded in call order.
pub struct ReplayModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    seen: Mutex<Vec<ChatRequest>>,
    calls: AtomicU32,
}

impl ReplayModel {
    pub fn replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(replies.into_iter().map(|s| Ok(s.into())).collect()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::replies(Vec::<String>::new())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request seen so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        match self.seen.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The newest user-role content of each recorded request, in call
    /// order. This is what each pipeline stage actually asked for.
    pub fn prompts(&self) -> Vec<String> {
        let seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.iter()
            .map(|request| {
                request
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")
                    .map(|m| m.content.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for ReplayModel {
    fn name(&self) -> &str {
        "replay"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request);
        }
        let next = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(err)) => Err(LlmError::Transport(err)),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

pub fn capture(index: usize) -> DisplayCapture {
    DisplayCapture {
        index,
        bounds: Region {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
        },
        image: vec![0u8; 64],
        width: 8,
        height: 8,
        is_active: index == 0,
    }
}

/// Desktop simulator: records every injected operation, can fail one
/// chosen action, and can present more than one display.
pub struct DesktopSim {
    calls: Mutex<Vec<String>>,
    fail_action: Option<&'static str>,
    displays: usize,
}

impl DesktopSim {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_action: None,
            displays: 1,
        })
    }

    pub fn failing(action: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_action: Some(action),
            displays: 1,
        })
    }

    pub fn with_displays(displays: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_action: None,
            displays,
        })
    }

    pub fn recorded(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, call: String) -> OperationOutcome {
        let action = call.split(':').next().unwrap_or("").to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail_action == Some(action.as_str()) {
            OperationOutcome::failed(format!("{action} failed"), "simulated failure")
        } else {
            OperationOutcome::ok(format!("{action} ok"))
        }
    }
}

#[async_trait]
impl CapabilityProvider for DesktopSim {
    fn name(&self) -> &str {
        "sim"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn click(&self, x: i32, y: i32, _button: MouseButton) -> OperationOutcome {
        self.record(format!("click:{x},{y}"))
    }

    async fn type_text(&self, text: &str) -> OperationOutcome {
        self.record(format!("type:{text}"))
    }

    async fn key_press(&self, combo: &str) -> OperationOutcome {
        self.record(format!("key:{combo}"))
    }

    async fn screenshot(&self) -> Result<DisplayCapture, CapabilityError> {
        Ok(capture(0))
    }

    async fn capture_displays(&self) -> Result<Vec<DisplayCapture>, CapabilityError> {
        Ok((0..self.displays).map(capture).collect())
    }

    async fn clipboard_get(&self) -> OperationOutcome {
        self.record("clipboard_get".to_string())
    }

    async fn clipboard_set(&self, text: &str) -> OperationOutcome {
        self.record(format!("clipboard_set:{text}"))
    }
}

/// Supervisor over the simulator with zero step delay and two attempts
/// per generation, plus the store the run will be recorded in.
pub async fn harness(
    sim: Arc<DesktopSim>,
    text: Arc<ReplayModel>,
    vision: Arc<ReplayModel>,
    screenshot_dir: &Path,
) -> (TaskSupervisor, Arc<MemoryStore>) {
    let backend = Arc::new(
        CapabilityBackend::new(Some(sim), None, true)
            .await
            .expect("simulator is always available"),
    );
    let opts = EngineOptions {
        policy: SuccessPolicy::default(),
        step_delay: Duration::ZERO,
        screenshot_dir: screenshot_dir.to_path_buf(),
        max_attempts: 2,
    };
    let engine = Arc::new(ExecutionEngine::new(backend, text.clone(), vision, None, opts));
    let decomposer = TaskDecomposer::new(text, 2);
    let store = Arc::new(MemoryStore::new());
    let supervisor = TaskSupervisor::new(engine, decomposer, store.clone());
    (supervisor, store)
}
