use std::sync::Arc;

use super::prompts;
use crate::error::GenerateError;
use crate::llm::{generate_with_retry, ChatModel, ChatRequest};
use crate::task::FileOperation;

/// Stage two for `file` steps.
pub struct FileGenerator {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
}

impl FileGenerator {
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32) -> Self {
        Self {
            model,
            max_attempts,
        }
    }

    pub async fn generate(&self, context: &str) -> Result<FileOperation, GenerateError> {
        let request = ChatRequest::new(prompts::FILE_SYSTEM)
            .with_user(format!("Action context: {context}"))
            .json();

        generate_with_retry(
            "file_operation",
            self.max_attempts,
            || {
                let model = Arc::clone(&self.model);
                let request = request.clone();
                async move { model.complete(request).await }
            },
            parse_file,
        )
        .await
    }
}

fn parse_file(text: &str) -> Result<FileOperation, String> {
    let op: FileOperation =
        serde_json::from_str(text).map_err(|e| format!("invalid file JSON: {e}"))?;
    op.validate()?;
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::FileAction;
    use crate::testutil::ScriptedModel;

    #[tokio::test]
    async fn generates_create_operation() {
        let model = Arc::new(ScriptedModel::replies([
            r#"{"operation": "create", "source_path": "/tmp/notes.txt", "content": "todo list"}"#,
        ]));
        let generator = FileGenerator::new(model, 2);
        let op = generator.generate("create a notes file").await.unwrap();
        assert_eq!(op.operation, FileAction::Create);
        assert_eq!(op.content.as_deref(), Some("todo list"));
    }

    #[tokio::test]
    async fn copy_without_target_is_retried() {
        let model = Arc::new(ScriptedModel::replies([
            r#"{"operation": "copy", "source_path": "/tmp/a.txt"}"#,
            r#"{"operation": "copy", "source_path": "/tmp/a.txt", "target_path": "/tmp/b.txt"}"#,
        ]));
        let generator = FileGenerator::new(model.clone(), 3);
        let op = generator.generate("copy a to b").await.unwrap();
        assert_eq!(op.target_path.as_deref(), Some("/tmp/b.txt"));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_action_exhausts() {
        let model = Arc::new(ScriptedModel::replies([
            r#"{"operation": "shred", "source_path": "/tmp/a.txt"}"#,
        ]));
        let generator = FileGenerator::new(model, 1);
        let err = generator.generate("shred the file").await.unwrap_err();
        assert!(err.is_exhausted());
    }
}
