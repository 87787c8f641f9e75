use std::sync::Arc;

use base64::Engine as _;

use super::types::{DisplayCapture, VisualAnalysis};
use crate::error::GenerateError;
use crate::generate::prompts;
use crate::llm::{generate_with_retry, ChatModel, ChatRequest, ImageAttachment};

/// The JSON path gets a short budget because the text fallback below
/// catches the misses.
pub const VISION_JSON_ATTEMPTS: u32 = 2;
const DESCRIBE_ATTEMPTS: u32 = 2;
const CONVERT_ATTEMPTS: u32 = 3;

/// Asks a vision-capable model to enumerate interactive elements on one
/// display. Two paths: structured JSON straight from the vision model,
/// and a fallback that lets the vision model answer in prose which the
/// text model then converts to the schema.
pub struct VisionAnalyzer {
    vision_model: Arc<dyn ChatModel>,
    text_model: Arc<dyn ChatModel>,
}

impl VisionAnalyzer {
    pub fn new(vision_model: Arc<dyn ChatModel>, text_model: Arc<dyn ChatModel>) -> Self {
        Self {
            vision_model,
            text_model,
        }
    }

    pub async fn analyze(
        &self,
        capture: &DisplayCapture,
        context: &str,
    ) -> Result<VisualAnalysis, GenerateError> {
        let image = ImageAttachment::png(
            base64::engine::general_purpose::STANDARD.encode(&capture.image),
        );
        let goal = format!(
            "Goal: {context}\nDisplay index: {} ({}x{})",
            capture.index, capture.width, capture.height
        );

        let request = ChatRequest::new(prompts::VISION_SYSTEM)
            .with_user(goal.clone())
            .with_image(image.clone())
            .json();
        let primary = generate_with_retry(
            "vision_analysis",
            VISION_JSON_ATTEMPTS,
            || {
                let model = Arc::clone(&self.vision_model);
                let request = request.clone();
                async move { model.complete(request).await }
            },
            parse_analysis,
        )
        .await;

        match primary {
            Ok(analysis) => Ok(analysis),
            Err(err) => {
                tracing::warn!(display = capture.index, %err, "vision JSON path failed, trying text fallback");
                self.fallback(image, &goal).await
            }
        }
    }

    /// Prose description by the vision model, converted to the schema by
    /// the text model.
    async fn fallback(
        &self,
        image: ImageAttachment,
        goal: &str,
    ) -> Result<VisualAnalysis, GenerateError> {
        let describe = ChatRequest::new(prompts::VISION_DESCRIBE_SYSTEM)
            .with_user(goal.to_string())
            .with_image(image);
        let description = generate_with_retry(
            "vision_describe",
            DESCRIBE_ATTEMPTS,
            || {
                let model = Arc::clone(&self.vision_model);
                let request = describe.clone();
                async move { model.complete(request).await }
            },
            |text| {
                if text.trim().is_empty() {
                    Err("empty description".to_string())
                } else {
                    Ok(text.to_string())
                }
            },
        )
        .await?;

        let convert = ChatRequest::new(prompts::VISION_CONVERT_SYSTEM)
            .with_user(description)
            .json();
        generate_with_retry(
            "vision_convert",
            CONVERT_ATTEMPTS,
            || {
                let model = Arc::clone(&self.text_model);
                let request = convert.clone();
                async move { model.complete(request).await }
            },
            parse_analysis,
        )
        .await
    }
}

pub(crate) fn parse_analysis(text: &str) -> Result<VisualAnalysis, String> {
    let analysis: VisualAnalysis =
        serde_json::from_str(text).map_err(|e| format!("invalid analysis JSON: {e}"))?;
    if analysis.is_empty() {
        return Err("analysis carries no elements and no recommendations".to_string());
    }
    Ok(analysis)
}

/// Trust score for one display's analysis: average element confidence
/// scaled by how many corroborating elements were found, saturating at
/// ten elements. No elements means no trust.
pub fn confidence(analysis: &VisualAnalysis) -> f64 {
    let n = analysis.elements_found.len();
    if n == 0 {
        return 0.0;
    }
    let avg: f64 = analysis
        .elements_found
        .iter()
        .map(|e| e.confidence.clamp(0.0, 1.0))
        .sum::<f64>()
        / n as f64;
    let count_factor = 0.7 + 0.3 * ((n as f64 / 10.0).min(1.0));
    avg * count_factor
}
