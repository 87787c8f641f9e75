use std::sync::Arc;

use super::types::OperationOutcome;
use super::CapabilityProvider;
use crate::error::CapabilityError;
use crate::task::MouseButton;
use crate::vision::DisplayCapture;

/// Hybrid capability backend. Holds up to two providers and routes each
/// call to the preferred one that currently reports available, so a
/// provider dying at runtime degrades to the other without
/// reconstruction. Construction fails when neither provider is usable;
/// there is no capability-less mode.
pub struct CapabilityBackend {
    native: Option<Arc<dyn CapabilityProvider>>,
    worker: Option<Arc<dyn CapabilityProvider>>,
    prefer_native: bool,
}

impl CapabilityBackend {
    pub async fn new(
        native: Option<Arc<dyn CapabilityProvider>>,
        worker: Option<Arc<dyn CapabilityProvider>>,
        prefer_native: bool,
    ) -> Result<Self, CapabilityError> {
        let backend = Self {
            native,
            worker,
            prefer_native,
        };
        let mut any = false;
        for provider in backend.ordered() {
            let available = provider.is_available().await;
            tracing::info!(provider = provider.name(), available, "probed capability provider");
            any = any || available;
        }
        if !any {
            return Err(CapabilityError::NoProviderAvailable);
        }
        Ok(backend)
    }

    fn ordered(&self) -> impl Iterator<Item = &Arc<dyn CapabilityProvider>> {
        let (first, second) = if self.prefer_native {
            (&self.native, &self.worker)
        } else {
            (&self.worker, &self.native)
        };
        first.iter().chain(second.iter())
    }

    /// Pick the provider for the next call, re-probing availability so a
    /// changed environment is picked up lazily.
    async fn active(&self) -> Result<Arc<dyn CapabilityProvider>, CapabilityError> {
        for provider in self.ordered() {
            if provider.is_available().await {
                return Ok(provider.clone());
            }
        }
        Err(CapabilityError::NoProviderAvailable)
    }

    pub async fn availability(&self) -> Vec<(String, bool)> {
        let mut report = Vec::new();
        for provider in self.ordered() {
            report.push((provider.name().to_string(), provider.is_available().await));
        }
        report
    }

    pub async fn click(&self, x: i32, y: i32, button: MouseButton) -> OperationOutcome {
        match self.active().await {
            Ok(provider) => provider.click(x, y, button).await,
            Err(err) => OperationOutcome::failed("click failed", err.to_string()),
        }
    }

    pub async fn type_text(&self, text: &str) -> OperationOutcome {
        match self.active().await {
            Ok(provider) => provider.type_text(text).await,
            Err(err) => OperationOutcome::failed("type failed", err.to_string()),
        }
    }

    pub async fn key_press(&self, combo: &str) -> OperationOutcome {
        match self.active().await {
            Ok(provider) => provider.key_press(combo).await,
            Err(err) => OperationOutcome::failed("key press failed", err.to_string()),
        }
    }

    pub async fn screenshot(&self) -> Result<DisplayCapture, CapabilityError> {
        self.active().await?.screenshot().await
    }

    pub async fn capture_displays(&self) -> Result<Vec<DisplayCapture>, CapabilityError> {
        self.active().await?.capture_displays().await
    }

    pub async fn clipboard_get(&self) -> OperationOutcome {
        match self.active().await {
            Ok(provider) => provider.clipboard_get().await,
            Err(err) => OperationOutcome::failed("clipboard read failed", err.to_string()),
        }
    }

    pub async fn clipboard_set(&self, text: &str) -> OperationOutcome {
        match self.active().await {
            Ok(provider) => provider.clipboard_set(text).await,
            Err(err) => OperationOutcome::failed("clipboard write failed", err.to_string()),
        }
    }
}
