use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::prompts;
use crate::llm::{generate_with_retry, ChatMessage, ChatModel, ChatRequest};
use crate::store::ConversationTurn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageIntent {
    Chat,
    Automation,
}

#[derive(Deserialize)]
struct IntentPayload {
    intent: MessageIntent,
}

/// Routes incoming messages: only `Automation` messages reach the
/// decomposer. Falls back to `Chat` when classification never produces a
/// valid answer, so an unreliable model cannot make the agent grab the
/// keyboard by accident.
pub struct MessageTriage {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
}

impl MessageTriage {
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32) -> Self {
        Self {
            model,
            max_attempts,
        }
    }

    pub async fn classify(&self, turns: &[ConversationTurn]) -> MessageIntent {
        let messages: Vec<ChatMessage> = turns
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            })
            .collect();
        let request = ChatRequest::new(prompts::TRIAGE_SYSTEM)
            .with_messages(messages)
            .json();

        let outcome = generate_with_retry(
            "message_triage",
            self.max_attempts,
            || {
                let model = Arc::clone(&self.model);
                let request = request.clone();
                async move { model.complete(request).await }
            },
            |text| {
                serde_json::from_str::<IntentPayload>(text)
                    .map(|p| p.intent)
                    .map_err(|e| format!("invalid intent JSON: {e}"))
            },
        )
        .await;

        match outcome {
            Ok(intent) => intent,
            Err(err) => {
                tracing::warn!(%err, "triage exhausted, defaulting to chat");
                MessageIntent::Chat
            }
        }
    }
}
