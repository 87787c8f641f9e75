use async_trait::async_trait;

use super::types::ChatRequest;
use crate::error::LlmError;

/// A generative text or vision backend. Implementations live outside the
/// core; the core only assumes calls can fail with transport errors and
/// that returned text may be malformed or wrapped in markup.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}
