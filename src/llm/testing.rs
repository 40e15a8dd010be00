//! Scripted [`LlmClient`] used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, ChatResponse, LlmClient, LlmError, ResponseFormat, ToolSchema};

/// Replays canned responses; repeats `fallback` once the script runs out.
pub(crate) struct ScriptedLlm {
    script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    fallback: Option<ChatResponse>,
    /// Messages sent on each call.
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
    /// Tool names offered on each call.
    pub offered_tools: Mutex<Vec<Vec<String>>>,
    /// Response format name requested on each call.
    pub response_formats: Mutex<Vec<Option<String>>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            offered_tools: Mutex::new(Vec::new()),
            response_formats: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: ChatResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
        response_format: Option<&ResponseFormat>,
    ) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.response_formats
            .lock()
            .unwrap()
            .push(response_format.map(|f| f.name().to_string()));
        self.offered_tools.lock().unwrap().push(
            tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.function.name.clone())
                .collect(),
        );

        match self.script.lock().unwrap().pop_front() {
            Some(next) => next,
            None => self.fallback.clone().ok_or(LlmError::EmptyResponse),
        }
    }
}
