//! Maps an action type to the agent that handles it.

use std::fmt;
use std::str::FromStr;

use crate::config::{Config, ConfigError};
use crate::llm::ResponseFormat;
use crate::tools::ToolKind;

use super::{prompt, report};

/// What the action was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    PrReview,
    IssueAnalyze,
    CodeScan,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::PrReview => "pr-review",
            ActionType::IssueAnalyze => "issue-analyze",
            ActionType::CodeScan => "code-scan",
        }
    }
}

impl FromStr for ActionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pr-review" => Ok(ActionType::PrReview),
            "issue-analyze" => Ok(ActionType::IssueAnalyze),
            "code-scan" => Ok(ActionType::CodeScan),
            _ => Err(ConfigError::UnknownActionType(s.to_string())),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PR_REVIEW_TOOLS: &[ToolKind] = &[
    ToolKind::GetPullRequest,
    ToolKind::GetPullRequestFiles,
    ToolKind::GetRepositoryInfo,
    ToolKind::GetRepositoryFileContent,
    ToolKind::ListRepositoryFiles,
    ToolKind::SearchCode,
    ToolKind::CreatePullRequestReview,
    ToolKind::UpdateOrCreatePrComment,
];

const ISSUE_ANALYZE_TOOLS: &[ToolKind] = &[
    ToolKind::GetRepositoryInfo,
    ToolKind::GetRepositoryStats,
    ToolKind::GetRepositoryFileContent,
    ToolKind::ListRepositoryFiles,
    ToolKind::SearchCode,
    ToolKind::GetIssue,
    ToolKind::ListIssueComments,
    ToolKind::ListIssueLabels,
    ToolKind::AddLabelsToIssue,
    ToolKind::AddIssueComment,
    ToolKind::UpdateOrCreateIssueComment,
];

const CODE_SCAN_TOOLS: &[ToolKind] = &[
    ToolKind::GetRepositoryInfo,
    ToolKind::GetRepositoryStats,
    ToolKind::GetRepositoryFileContent,
    ToolKind::ListRepositoryFiles,
    ToolKind::SearchCode,
    ToolKind::CreateIssue,
];

/// Tool subset for an action. Approval is only offered to the reviewer when enabled.
pub fn tools_for(action: ActionType, auto_approve: bool) -> Vec<ToolKind> {
    match action {
        ActionType::PrReview => {
            let mut tools = PR_REVIEW_TOOLS.to_vec();
            if auto_approve {
                tools.push(ToolKind::ApprovePullRequest);
            }
            tools
        }
        ActionType::IssueAnalyze => ISSUE_ANALYZE_TOOLS.to_vec(),
        ActionType::CodeScan => CODE_SCAN_TOOLS.to_vec(),
    }
}

/// Everything the conversation runner needs to know about the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub action: ActionType,
    pub model: String,
    pub system_prompt: String,
    pub tools: Vec<ToolKind>,
    pub max_turns: usize,
    /// Shape of the final report.
    pub response_format: ResponseFormat,
}

impl AgentConfig {
    /// Resolve the agent for the configured action type.
    ///
    /// Fails with [`ConfigError::UnknownActionType`] before anything touches the network.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let action: ActionType = config.action_type.parse()?;
        Ok(Self::new(
            action,
            config.model_or_default(),
            config.custom_prompt.as_deref(),
            config.max_turns,
            config.auto_approve,
        ))
    }

    pub fn new(
        action: ActionType,
        model: &str,
        custom_prompt: Option<&str>,
        max_turns: usize,
        auto_approve: bool,
    ) -> Self {
        let tools = tools_for(action, auto_approve);
        let system_prompt = prompt::build_system_prompt(action, &tools, custom_prompt);

        Self {
            action,
            model: model.to_string(),
            system_prompt,
            tools,
            max_turns,
            response_format: report::response_format(action),
        }
    }
}
