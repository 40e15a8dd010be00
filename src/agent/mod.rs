//! Agent module - configures and runs the agent for one action.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Pick the system prompt and tool subset for the action type
//! 2. Call the LLM with the event summary and the available tools
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM produces a final response or the turn budget runs out
//! 5. Decode the final response into the action's typed report

mod agent_loop;
mod configurator;
mod prompt;
mod report;
mod transcript;

pub use agent_loop::{ConversationRunner, RunOutcome, RunState, RunStatus};
pub use configurator::{tools_for, ActionType, AgentConfig};
pub use prompt::{build_initial_message, build_system_prompt};
pub use report::{
    response_format, AgentReport, CodeIssue, CodeScanReport, IssueAnalysisReport, IssueCategory,
    PrReviewReport,
};
pub use transcript::{EntryType, Transcript, TranscriptEntry};
