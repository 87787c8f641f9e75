use std::sync::Arc;

use super::prompts;
use crate::error::GenerateError;
use crate::llm::{generate_with_retry, ChatMessage, ChatModel, ChatRequest};
use crate::store::ConversationTurn;
use crate::task::TaskDecomposition;

/// Stage one: turn an instruction (with its conversation history) into an
/// ordered step plan. Step-level `context` strings are taken at face
/// value here; their semantics are checked by the stage-two generators.
pub struct TaskDecomposer {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
}

impl TaskDecomposer {
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32) -> Self {
        Self {
            model,
            max_attempts,
        }
    }

    pub async fn decompose(
        &self,
        turns: &[ConversationTurn],
    ) -> Result<TaskDecomposition, GenerateError> {
        let messages: Vec<ChatMessage> = turns
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            })
            .collect();
        let request = ChatRequest::new(prompts::DECOMPOSE_SYSTEM)
            .with_messages(messages)
            .json();

        generate_with_retry(
            "task_decomposition",
            self.max_attempts,
            || {
                let model = Arc::clone(&self.model);
                let request = request.clone();
                async move { model.complete(request).await }
            },
            parse_decomposition,
        )
        .await
    }
}

fn parse_decomposition(text: &str) -> Result<TaskDecomposition, String> {
    let decomposition: TaskDecomposition =
        serde_json::from_str(text).map_err(|e| format!("invalid decomposition JSON: {e}"))?;

    if decomposition.description.trim().is_empty() {
        return Err("decomposition description is empty".to_string());
    }
    if decomposition.steps.is_empty() {
        return Err("decomposition has no steps".to_string());
    }
    for (index, step) in decomposition.steps.iter().enumerate() {
        if step.description.trim().is_empty() {
            return Err(format!("step {index} has an empty description"));
        }
    }
    Ok(decomposition)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::task::{StepKind, TaskComplexity};
    use crate::testutil::ScriptedModel;

    const GOOD_PLAN: &str = r#"{
        "task_type": "simple",
        "description": "take a screenshot",
        "steps": [
            {"step_type": "screenshot", "description": "capture the screen", "context": "full screen"}
        ],
        "expected_outcome": "a png on disk",
        "risk_level": "low",
        "estimated_time_seconds": 5
    }"#;

    #[tokio::test]
    async fn parses_fenced_model_output() {
        let model = Arc::new(ScriptedModel::replies([format!("```json\n{GOOD_PLAN}\n```")]));
        let decomposer = TaskDecomposer::new(model.clone(), 3);
        let plan = decomposer
            .decompose(&[ConversationTurn::user("take a screenshot")])
            .await
            .unwrap();
        assert_eq!(plan.task_type, TaskComplexity::Simple);
        assert_eq!(plan.steps[0].step_type, StepKind::Screenshot);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn retries_until_valid_then_stops() {
        let model = Arc::new(ScriptedModel::replies([
            "not json at all".to_string(),
            r#"{"task_type": "simple", "description": "x", "steps": []}"#.to_string(),
            GOOD_PLAN.to_string(),
        ]));
        let decomposer = TaskDecomposer::new(model.clone(), 3);
        let plan = decomposer
            .decompose(&[ConversationTurn::user("go")])
            .await
            .unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn empty_steps_exhausts_attempts() {
        let empty = r#"{"task_type": "simple", "description": "x", "steps": []}"#;
        let model = Arc::new(ScriptedModel::replies([empty, empty]));
        let decomposer = TaskDecomposer::new(model.clone(), 2);
        let err = decomposer
            .decompose(&[ConversationTurn::user("go")])
            .await
            .unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_step_kind_is_a_decomposition_failure() {
        let bad = r#"{
            "task_type": "simple",
            "description": "x",
            "steps": [{"step_type": "levitate", "description": "float"}]
        }"#;
        let model = Arc::new(ScriptedModel::replies([bad]));
        let decomposer = TaskDecomposer::new(model, 1);
        let err = decomposer
            .decompose(&[ConversationTurn::user("go")])
            .await
            .unwrap_err();
        assert!(err.is_exhausted());
    }
}
