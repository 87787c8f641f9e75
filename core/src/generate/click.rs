use std::fmt::Write as _;
use std::sync::Arc;

use super::prompts;
use crate::error::GenerateError;
use crate::llm::{generate_with_retry, ChatModel, ChatRequest};
use crate::task::ClickOperation;
use crate::vision::VisualAnalysis;

/// Stage two for `click` steps. Grounding is an enrichment: when the
/// visual analysis lists clickable elements their positions are appended
/// to the prompt, but the generator still produces a best-effort guess
/// without them.
pub struct ClickGenerator {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
}

impl ClickGenerator {
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32) -> Self {
        Self {
            model,
            max_attempts,
        }
    }

    pub async fn generate(
        &self,
        context: &str,
        grounding: Option<&VisualAnalysis>,
    ) -> Result<ClickOperation, GenerateError> {
        let mut user = format!("Action context: {context}");
        if let Some(summary) = grounding.and_then(grounding_summary) {
            let _ = write!(user, "\n\nClickable elements currently on screen:\n{summary}");
        }

        let request = ChatRequest::new(prompts::CLICK_SYSTEM).with_user(user).json();

        generate_with_retry(
            "click_operation",
            self.max_attempts,
            || {
                let model = Arc::clone(&self.model);
                let request = request.clone();
                async move { model.complete(request).await }
            },
            parse_click,
        )
        .await
    }
}

fn grounding_summary(analysis: &VisualAnalysis) -> Option<String> {
    let mut lines = String::new();
    for element in analysis.clickable_elements() {
        let c = element.coordinates;
        let _ = writeln!(
            lines,
            "- {}: ({}, {}) {}x{}",
            element.description, c.x, c.y, c.width, c.height
        );
    }
    (!lines.is_empty()).then(|| lines.trim_end().to_string())
}

fn parse_click(text: &str) -> Result<ClickOperation, String> {
    let op: ClickOperation =
        serde_json::from_str(text).map_err(|e| format!("invalid click JSON: {e}"))?;
    op.validate()?;
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::MouseButton;
    use crate::testutil::ScriptedModel;
    use crate::vision::{Region, VisualElement};

    fn analysis_with_button() -> VisualAnalysis {
        VisualAnalysis {
            elements_found: vec![
                VisualElement {
                    element_type: "button".to_string(),
                    description: "Submit button".to_string(),
                    coordinates: Region {
                        x: 400,
                        y: 300,
                        width: 120,
                        height: 40,
                    },
                    confidence: 0.9,
                    text_content: "Submit".to_string(),
                    clickable: true,
                },
                VisualElement {
                    element_type: "text".to_string(),
                    description: "Header".to_string(),
                    coordinates: Region::default(),
                    confidence: 0.8,
                    text_content: String::new(),
                    clickable: false,
                },
            ],
            ..VisualAnalysis::default()
        }
    }

    #[test]
    fn summary_lists_only_clickable_elements() {
        let summary = grounding_summary(&analysis_with_button()).unwrap();
        assert!(summary.contains("Submit button: (400, 300) 120x40"));
        assert!(!summary.contains("Header"));
    }

    #[test]
    fn summary_absent_when_nothing_clickable() {
        let analysis = VisualAnalysis::default();
        assert!(grounding_summary(&analysis).is_none());
    }

    #[tokio::test]
    async fn generates_validated_click() {
        let model = Arc::new(ScriptedModel::replies([
            r#"```json
{"x": 460, "y": 320, "button": "left"}
```"#,
        ]));
        let generator = ClickGenerator::new(model, 3);
        let op = generator
            .generate("press the submit button", Some(&analysis_with_button()))
            .await
            .unwrap();
        assert_eq!((op.x, op.y), (460, 320));
        assert_eq!(op.button, MouseButton::Left);
    }

    #[tokio::test]
    async fn invalid_coordinates_consume_attempts() {
        let model = Arc::new(ScriptedModel::replies([
            r#"{"x": 0, "y": 300, "button": "left"}"#,
            r#"{"x": 500, "y": 300, "button": "left"}"#,
        ]));
        let generator = ClickGenerator::new(model.clone(), 3);
        let op = generator.generate("click ok", None).await.unwrap();
        assert_eq!(op.x, 500);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn works_without_grounding() {
        let model = Arc::new(ScriptedModel::replies([r#"{"x": 10, "y": 20}"#]));
        let generator = ClickGenerator::new(model, 1);
        let op = generator.generate("click somewhere sensible", None).await.unwrap();
        assert_eq!(op.button, MouseButton::Left);
    }
}
