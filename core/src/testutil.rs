//! Shared test doubles for unit tests across the crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{ChatModel, ChatRequest};
use crate::vision::{DisplayCapture, Region};

/// Chat model returning a scripted sequence of responses, then failing.
pub(crate) struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicU32,
}

impl ScriptedModel {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|s| Ok(s.into())))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(err)) => Err(LlmError::Transport(err)),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

pub(crate) fn capture(index: usize) -> DisplayCapture {
    DisplayCapture {
        index,
        bounds: Region {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        },
        image: vec![0u8; 16],
        width: 4,
        height: 4,
        is_active: index == 0,
    }
}
