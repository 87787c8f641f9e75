use serde::{Deserialize, Serialize};

use crate::task::SuccessPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or the data dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "deskpilot_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// One OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub api_key: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434/v1".to_string()
}

impl Default for ModelEndpoint {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: String::new(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_text_endpoint")]
    pub text: ModelEndpoint,

    #[serde(default = "default_vision_endpoint")]
    pub vision: ModelEndpoint,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Attempt budget for generation calls (decomposition, operations).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_text_endpoint() -> ModelEndpoint {
    ModelEndpoint {
        model: "llama3.1".to_string(),
        ..ModelEndpoint::default()
    }
}

fn default_vision_endpoint() -> ModelEndpoint {
    ModelEndpoint {
        model: "llama3.2-vision".to_string(),
        ..ModelEndpoint::default()
    }
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            text: default_text_endpoint(),
            vision: default_vision_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Candidate paths for the external automation worker binary, tried in
    /// order before falling back to a PATH lookup.
    #[serde(default = "default_worker_paths")]
    pub worker_paths: Vec<String>,

    #[serde(default = "default_worker_timeout_ms")]
    pub worker_timeout_ms: u64,

    /// Prefer the in-process provider over the external worker.
    #[serde(default = "default_prefer_native")]
    pub prefer_native: bool,

    /// Pause between steps so the desktop can settle.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    #[serde(default)]
    pub screenshot_dir: Option<String>,
}

fn default_worker_paths() -> Vec<String> {
    vec![
        "./deskpilot-worker".to_string(),
        "./bin/deskpilot-worker".to_string(),
    ]
}

fn default_worker_timeout_ms() -> u64 {
    10_000
}

fn default_prefer_native() -> bool {
    true
}

fn default_step_delay_ms() -> u64 {
    500
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            worker_paths: default_worker_paths(),
            worker_timeout_ms: default_worker_timeout_ms(),
            prefer_native: default_prefer_native(),
            step_delay_ms: default_step_delay_ms(),
            screenshot_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub success: SuccessPolicyConfig,
}

/// Tolerance band for task-level success, see `SuccessPolicy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessPolicyConfig {
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,

    #[serde(default = "default_max_errors")]
    pub max_errors: usize,
}

fn default_min_success_rate() -> f64 {
    0.8
}

fn default_max_errors() -> usize {
    2
}

impl Default for SuccessPolicyConfig {
    fn default() -> Self {
        Self {
            min_success_rate: default_min_success_rate(),
            max_errors: default_max_errors(),
        }
    }
}

impl SuccessPolicyConfig {
    pub fn policy(&self) -> SuccessPolicy {
        SuccessPolicy {
            min_success_rate: self.min_success_rate,
            max_errors: self.max_errors,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_events_enabled")]
    pub enabled: bool,

    /// "stdout:" or a JSONL file path.
    #[serde(default = "default_events_path")]
    pub path: String,

    #[serde(default = "default_events_capacity")]
    pub channel_capacity: usize,

    #[serde(default = "default_events_drop")]
    pub drop_when_full: bool,
}

fn default_events_enabled() -> bool {
    true
}

fn default_events_path() -> String {
    "./task.events.jsonl".to_string()
}

fn default_events_capacity() -> usize {
    100
}

fn default_events_drop() -> bool {
    true
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: default_events_enabled(),
            path: default_events_path(),
            channel_capacity: default_events_capacity(),
            drop_when_full: default_events_drop(),
        }
    }
}
