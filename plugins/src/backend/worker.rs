use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use deskpilot_core::automation::{CapabilityProvider, OperationOutcome};
use deskpilot_core::error::CapabilityError;
use deskpilot_core::task::MouseButton;
use deskpilot_core::vision::{DisplayCapture, Region};

pub const WORKER_BIN: &str = "deskpilot-worker";

/// External-process provider. Each call spawns the worker binary with the
/// JSON request as its single argument and reads one JSON response from
/// stdout:
///
/// ```text
/// request:  { "action": "click", "parameters": { "x": 10, "y": 20 } }
/// response: { "success": true, "message": "...", "data": {...}, "error": "..." }
/// ```
pub struct WorkerProvider {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl WorkerProvider {
    /// Probes the configured candidate paths in order, then PATH. A
    /// provider without a binary stays constructible but unavailable.
    pub fn discover(candidates: &[String], timeout_ms: u64) -> Self {
        let binary = find_worker(candidates);
        match &binary {
            Some(path) => tracing::info!(path = %path.display(), "automation worker found"),
            None => tracing::debug!("automation worker not found"),
        }
        Self {
            binary,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn at(path: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            binary: Some(path.into()),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    async fn call(
        &self,
        action: &str,
        parameters: serde_json::Value,
    ) -> Result<WorkerResponse, CapabilityError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| CapabilityError::Unavailable("worker".to_string()))?;
        let request = serde_json::json!({ "action": action, "parameters": parameters });

        let output = timeout(
            self.timeout,
            Command::new(binary)
                .arg(request.to_string())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            CapabilityError::Protocol(format!(
                "worker timed out after {} ms",
                self.timeout.as_millis()
            ))
        })?
        .map_err(|err| CapabilityError::Spawn(err.to_string()))?;

        serde_json::from_slice(&output.stdout)
            .map_err(|err| CapabilityError::Protocol(format!("bad worker response: {err}")))
    }

    async fn run(&self, action: &str, parameters: serde_json::Value) -> OperationOutcome {
        let started = Instant::now();
        match self.call(action, parameters).await {
            Ok(response) => response.into_outcome().with_duration(started),
            Err(err) => {
                OperationOutcome::failed(format!("worker {action} failed"), err.to_string())
                    .with_duration(started)
            }
        }
    }

    async fn capture(&self, display: Option<usize>) -> Result<DisplayCapture, CapabilityError> {
        let parameters = match display {
            Some(index) => serde_json::json!({ "display": index }),
            None => serde_json::json!({}),
        };
        let response = self.call("screenshot", parameters).await?;
        if !response.success {
            return Err(CapabilityError::Protocol(
                response.error.unwrap_or(response.message),
            ));
        }
        let data = response.data.ok_or_else(|| {
            CapabilityError::Protocol("screenshot response carries no data".to_string())
        })?;
        let encoded = data.get("image").and_then(|v| v.as_str()).ok_or_else(|| {
            CapabilityError::Protocol("screenshot response carries no image".to_string())
        })?;
        let image = BASE64
            .decode(encoded)
            .map_err(|err| CapabilityError::Protocol(format!("bad screenshot payload: {err}")))?;

        let reported = data
            .get("width")
            .and_then(|v| v.as_u64())
            .zip(data.get("height").and_then(|v| v.as_u64()));
        let (width, height) = match reported {
            Some((w, h)) => (w as u32, h as u32),
            None => super::png_dimensions(&image).unwrap_or((0, 0)),
        };

        let index = display.unwrap_or(0);
        Ok(DisplayCapture {
            index,
            bounds: Region {
                x: 0,
                y: 0,
                width,
                height,
            },
            image,
            width,
            height,
            is_active: index == 0,
        })
    }
}

fn find_worker(candidates: &[String]) -> Option<PathBuf> {
    for candidate in candidates {
        let mut paths = vec![PathBuf::from(candidate)];
        if cfg!(windows) && !candidate.ends_with(".exe") {
            paths.push(PathBuf::from(format!("{candidate}.exe")));
        }
        for path in paths {
            if path.is_file() {
                return Some(std::fs::canonicalize(&path).unwrap_or(path));
            }
        }
    }
    which::which(WORKER_BIN).ok()
}

#[async_trait]
impl CapabilityProvider for WorkerProvider {
    fn name(&self) -> &str {
        "worker"
    }

    async fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    async fn click(&self, x: i32, y: i32, button: MouseButton) -> OperationOutcome {
        self.run(
            "click",
            serde_json::json!({ "x": x, "y": y, "button": button.as_str() }),
        )
        .await
    }

    async fn type_text(&self, text: &str) -> OperationOutcome {
        self.run("type", serde_json::json!({ "text": text })).await
    }

    async fn key_press(&self, combo: &str) -> OperationOutcome {
        self.run("keypress", serde_json::json!({ "key": combo }))
            .await
    }

    async fn screenshot(&self) -> Result<DisplayCapture, CapabilityError> {
        self.capture(None).await
    }

    async fn capture_displays(&self) -> Result<Vec<DisplayCapture>, CapabilityError> {
        let count = match self.call("info", serde_json::json!({})).await {
            Ok(response) if response.success => response
                .data
                .as_ref()
                .and_then(|d| d.get("display_count"))
                .and_then(|v| v.as_u64())
                .unwrap_or(1) as usize,
            _ => 1,
        };
        if count <= 1 {
            return Ok(vec![self.screenshot().await?]);
        }

        let mut captures = Vec::with_capacity(count);
        for index in 0..count {
            match self.capture(Some(index)).await {
                Ok(capture) => captures.push(capture),
                Err(err) => tracing::warn!(display = index, %err, "display capture failed"),
            }
        }
        if captures.is_empty() {
            return Err(CapabilityError::Protocol(
                "no display could be captured".to_string(),
            ));
        }
        Ok(captures)
    }

    async fn clipboard_get(&self) -> OperationOutcome {
        self.run("clipboard_get", serde_json::json!({})).await
    }

    async fn clipboard_set(&self, text: &str) -> OperationOutcome {
        self.run("clipboard_set", serde_json::json!({ "text": text }))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct WorkerResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl WorkerResponse {
    fn into_outcome(self) -> OperationOutcome {
        OperationOutcome {
            success: self.success,
            message: self.message,
            data: self.data,
            error: self.error,
            duration_ms: 0,
            timestamp: chrono::Utc::now(),
        }
    }
}
