use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Create,
    Delete,
    Move,
    Copy,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete click. Coordinates are kept signed so that out-of-range
/// model output is caught by `validate` instead of failing at parse time
/// with a less useful message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickOperation {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub button: MouseButton,
}

impl ClickOperation {
    pub fn validate(&self) -> Result<(), String> {
        if self.x <= 0 {
            return Err(format!("click x must be positive, got {}", self.x));
        }
        if self.y <= 0 {
            return Err(format!("click y must be positive, got {}", self.y));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeOperation {
    pub text: String,
}

impl TypeOperation {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.is_empty() {
            return Err("type text must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOperation {
    pub operation: FileAction,
    pub source_path: String,
    #[serde(default)]
    pub target_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl FileOperation {
    pub fn validate(&self) -> Result<(), String> {
        if self.source_path.trim().is_empty() {
            return Err("file source_path must not be empty".to_string());
        }
        match self.operation {
            FileAction::Move | FileAction::Copy => {
                if self
                    .target_path
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .is_empty()
                {
                    return Err(format!(
                        "file operation '{}' requires target_path",
                        self.operation
                    ));
                }
            }
            FileAction::Create => {
                if self.content.is_none() {
                    return Err("file operation 'create' requires content".to_string());
                }
            }
            FileAction::Delete => {}
        }
        Ok(())
    }
}
