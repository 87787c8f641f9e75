use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse complexity class assigned by the decomposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskComplexity {
    Simple,
    Composite,
    Complex,
}

impl fmt::Display for TaskComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Simple => "simple",
            Self::Composite => "composite",
            Self::Complex => "complex",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// Closed set of plannable actions. An unknown kind in model output is a
/// decomposition parse failure, never an execution-time surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Click,
    Type,
    LaunchApp,
    File,
    Screenshot,
    Clipboard,
    Wait,
    KeyPress,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Type => "type",
            Self::LaunchApp => "launch_app",
            Self::File => "file",
            Self::Screenshot => "screenshot",
            Self::Clipboard => "clipboard",
            Self::Wait => "wait",
            Self::KeyPress => "key_press",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned action without concrete parameters. Stage two fills the
/// parameters from `context` (and live screen analysis when requested).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepPlan {
    pub step_type: StepKind,
    pub description: String,
    #[serde(default)]
    pub requires_screen_analysis: bool,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub optional: bool,
}

fn default_priority() -> u8 {
    5
}

impl StepPlan {
    pub fn new(step_type: StepKind, description: impl Into<String>) -> Self {
        Self {
            step_type,
            description: description.into(),
            requires_screen_analysis: false,
            context: String::new(),
            priority: default_priority(),
            optional: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_screen_analysis(mut self) -> Self {
        self.requires_screen_analysis = true;
        self
    }
}

/// The ordered plan for one task. Produced once by the decomposer and
/// read-only for the rest of the task's life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDecomposition {
    pub task_type: TaskComplexity,
    pub description: String,
    pub steps: Vec<StepPlan>,
    #[serde(default)]
    pub expected_outcome: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub estimated_time_seconds: u64,
}
