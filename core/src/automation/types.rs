use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform result of one capability call, shared by every provider and
/// mirrored on the external worker's wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl OperationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_duration(mut self, started: std::time::Instant) -> Self {
        self.duration_ms = started.elapsed().as_millis() as u64;
        self
    }

    /// Error text for logs and step results, falling back to the message.
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_success_flag() {
        let ok = OperationOutcome::ok("clicked");
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = OperationOutcome::failed("click failed", "no display");
        assert!(!failed.success);
        assert_eq!(failed.error_text(), "no display");
    }

    #[test]
    fn outcome_round_trips_as_json() {
        let outcome =
            OperationOutcome::ok_with_data("screenshot", serde_json::json!({"width": 1920}));
        let s = serde_json::to_string(&outcome).unwrap();
        let back: OperationOutcome = serde_json::from_str(&s).unwrap();
        assert!(back.success);
        assert_eq!(back.data.unwrap()["width"], 1920);
    }
}
