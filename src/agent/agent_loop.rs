//! Conversation runner.
//!
//! Drives the model and the tool registry through an explicit state machine:
//!
//! ```text
//! AwaitingModelResponse --tool calls--> AwaitingToolResults --turns left--> AwaitingModelResponse
//!          |                                    |
//!          +--no tool calls--> Completed        +--budget spent--> TurnLimitExceeded
//! ```
//!
//! Every model invocation is one turn and the runner never exceeds the budget.

use std::sync::Arc;

use serde_json::json;

use crate::llm::{ChatMessage, LlmClient, LlmError, ToolCall};
use crate::tools::ToolRegistry;

use super::configurator::AgentConfig;
use super::report::AgentReport;
use super::transcript::{EntryType, Transcript};

/// Tool output longer than this is cut in the transcript.
const TRANSCRIPT_MAX_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    AwaitingModelResponse,
    AwaitingToolResults,
    Completed,
    TurnLimitExceeded,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Soft stop: the budget ran out while the model still wanted tools.
    TurnLimitExceeded,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Model invocations made.
    pub turns: usize,
    /// Final answer; `None` when the turn limit was hit.
    pub final_output: Option<String>,
    /// Final answer decoded as the action's report, when it matched the schema.
    pub report: Option<AgentReport>,
    /// States visited, in order.
    pub states: Vec<RunState>,
    pub transcript: Transcript,
}

/// Runs one agent conversation to completion.
pub struct ConversationRunner {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl ConversationRunner {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self { llm, tools, config }
    }

    /// Run the conversation starting from `input`.
    ///
    /// Provider errors abort the run. Tool failures are reported back to the
    /// model and never abort it.
    pub async fn run(&self, input: &str) -> Result<RunOutcome, LlmError> {
        let mut messages = vec![
            ChatMessage::system(self.config.system_prompt.clone()),
            ChatMessage::user(input),
        ];
        let tool_schemas = self.tools.get_tool_schemas();

        let mut transcript = Transcript::default();
        let mut states = Vec::new();
        let mut turns = 0;
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut final_output = None;
        let mut state = RunState::AwaitingModelResponse;

        loop {
            tracing::debug!(?state, turn = turns, "Runner state");
            states.push(state);

            state = match state {
                RunState::AwaitingModelResponse => {
                    turns += 1;
                    tracing::debug!(turn = turns, max_turns = self.config.max_turns, "Calling model");

                    let response = self
                        .llm
                        .chat_completion(
                            &self.config.model,
                            &messages,
                            Some(tool_schemas.as_slice()),
                            Some(&self.config.response_format),
                        )
                        .await?;

                    if let Some(usage) = &response.usage {
                        tracing::debug!(
                            turn = turns,
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Token usage"
                        );
                    }

                    if response.tool_calls.is_empty() {
                        let content = response.content.unwrap_or_default();
                        transcript.push(turns, EntryType::FinalAnswer, content.clone(), None);
                        final_output = Some(content);
                        RunState::Completed
                    } else {
                        if let Some(text) = response.content.as_deref().filter(|t| !t.trim().is_empty()) {
                            transcript.push(turns, EntryType::ModelMessage, text, None);
                        }
                        messages.push(ChatMessage::assistant(
                            response.content,
                            response.tool_calls.clone(),
                        ));
                        pending = response.tool_calls;
                        RunState::AwaitingToolResults
                    }
                }

                RunState::AwaitingToolResults => {
                    for call in pending.drain(..) {
                        let content = self.execute_tool_call(&call, turns, &mut transcript).await;
                        messages.push(ChatMessage::tool(call.id, content));
                    }

                    if turns >= self.config.max_turns {
                        tracing::warn!(
                            max_turns = self.config.max_turns,
                            "Turn limit reached before the agent finished"
                        );
                        RunState::TurnLimitExceeded
                    } else {
                        RunState::AwaitingModelResponse
                    }
                }

                RunState::Completed | RunState::TurnLimitExceeded => break,
            };
        }

        let status = match state {
            RunState::TurnLimitExceeded => RunStatus::TurnLimitExceeded,
            _ => RunStatus::Completed,
        };

        let report = final_output
            .as_deref()
            .and_then(|text| match AgentReport::parse(self.config.action, text) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!(
                        format = self.config.response_format.name(),
                        error = %e,
                        "Final answer does not match the report schema"
                    );
                    None
                }
            });

        Ok(RunOutcome {
            status,
            turns,
            final_output,
            report,
            states,
            transcript,
        })
    }

    /// Execute one tool call and render its result for the model.
    async fn execute_tool_call(&self, call: &ToolCall, turn: usize, transcript: &mut Transcript) -> String {
        let name = call.function.name.as_str();
        transcript.push(turn, EntryType::ToolCall, call.function.arguments.clone(), Some(name));

        match self.tools.execute(name, &call.function.arguments).await {
            Ok(value) => {
                let content = value.to_string();
                transcript.push(
                    turn,
                    EntryType::ToolResult,
                    crate::tools::truncate_text(&content, TRANSCRIPT_MAX_CHARS),
                    Some(name),
                );
                content
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                let message = e.to_string();
                transcript.push(turn, EntryType::ToolError, message.clone(), Some(name));
                json!({ "error": message }).to_string()
            }
        }
    }
}
