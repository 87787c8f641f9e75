//! Conversation and task stores. The core only needs two thin contracts:
//! read recent turns for decomposition input and persist task summaries.
//! Durable implementations live with the embedding application; the
//! in-memory store here backs the CLI and tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::TaskExecutionResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append(&self, turn: ConversationTurn);

    /// Most recent `limit` turns in chronological order.
    async fn recent(&self, limit: usize) -> Vec<ConversationTurn>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn record(&self, result: &TaskExecutionResult);

    async fn last(&self) -> Option<TaskExecutionResult>;
}

#[derive(Default)]
pub struct MemoryStore {
    turns: Mutex<Vec<ConversationTurn>>,
    tasks: Mutex<Vec<TaskExecutionResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append(&self, turn: ConversationTurn) {
        if let Ok(mut turns) = self.turns.lock() {
            turns.push(turn);
        }
    }

    async fn recent(&self, limit: usize) -> Vec<ConversationTurn> {
        match self.turns.lock() {
            Ok(turns) => {
                let skip = turns.len().saturating_sub(limit);
                turns[skip..].to_vec()
            }
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn record(&self, result: &TaskExecutionResult) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(result.clone());
        }
    }

    async fn last(&self) -> Option<TaskExecutionResult> {
        self.tasks.lock().ok().and_then(|tasks| tasks.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recent_returns_newest_turns_in_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.append(ConversationTurn::user(format!("message {i}"))).await;
        }
        let recent = store.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "message 3");
        assert_eq!(recent[1].content, "message 4");

        let all = store.recent(100).await;
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn task_store_keeps_latest_result() {
        let store = MemoryStore::new();
        assert!(TaskStore::last(&store).await.is_none());

        let mut result = TaskExecutionResult::started("t-1");
        result.finalize(
            crate::task::TaskState::Completed,
            &crate::task::SuccessPolicy::default(),
        );
        store.record(&result).await;

        let last = TaskStore::last(&store).await.unwrap();
        assert_eq!(last.task_id, "t-1");
    }
}
