use std::sync::Arc;

use super::prompts;
use crate::error::GenerateError;
use crate::llm::{generate_with_retry, ChatModel, ChatRequest};
use crate::task::TypeOperation;

/// Stage two for `type` steps.
pub struct TypeGenerator {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
}

impl TypeGenerator {
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32) -> Self {
        Self {
            model,
            max_attempts,
        }
    }

    pub async fn generate(&self, context: &str) -> Result<TypeOperation, GenerateError> {
        let request = ChatRequest::new(prompts::TYPE_SYSTEM)
            .with_user(format!("Action context: {context}"))
            .json();

        generate_with_retry(
            "type_operation",
            self.max_attempts,
            || {
                let model = Arc::clone(&self.model);
                let request = request.clone();
                async move { model.complete(request).await }
            },
            parse_type,
        )
        .await
    }
}

fn parse_type(text: &str) -> Result<TypeOperation, String> {
    let op: TypeOperation =
        serde_json::from_str(text).map_err(|e| format!("invalid type JSON: {e}"))?;
    op.validate()?;
    Ok(op)
}
