//! Capability backend: the uniform surface over physical input-injection
//! and screen-capture providers, plus the local executors (files, app
//! launch) that do not need a desktop backend.

pub mod files;
pub mod launcher;
pub mod selector;
pub mod types;

use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::task::MouseButton;
use crate::vision::DisplayCapture;
pub use files::apply_file_operation;
pub use launcher::AppLauncher;
pub use selector::CapabilityBackend;
pub use types::OperationOutcome;

/// One automation provider (in-process or external). Implementations
/// carry the per-platform dispatch; callers only see the uniform
/// contract. Availability may change at runtime and is re-checked by the
/// selector before each call.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn is_available(&self) -> bool;

    async fn click(&self, x: i32, y: i32, button: MouseButton) -> OperationOutcome;

    async fn type_text(&self, text: &str) -> OperationOutcome;

    /// `combo` is a normalized key chord such as "enter" or "ctrl+c".
    async fn key_press(&self, combo: &str) -> OperationOutcome;

    async fn screenshot(&self) -> Result<DisplayCapture, CapabilityError>;

    /// One capture per display. Providers that cannot enumerate displays
    /// fall back to the primary capture.
    async fn capture_displays(&self) -> Result<Vec<DisplayCapture>, CapabilityError> {
        Ok(vec![self.screenshot().await?])
    }

    async fn clipboard_get(&self) -> OperationOutcome;

    async fn clipboard_set(&self, text: &str) -> OperationOutcome;
}
