//! Tool registry for the agent.
//!
//! Every tool is a [`ToolKind`] variant with a description, a JSON schema and a
//! typed argument struct. [`ToolRegistry::execute`] decodes the model's
//! arguments, checks that the tool is enabled for the current action and runs
//! it against GitHub. Failures come back as [`ToolError`] so the agent loop can
//! hand them to the model instead of aborting.

mod issues;
mod pulls;
mod repo;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::github::{GitHubApi, GitHubError, RepoName};
use crate::llm::{FunctionSchema, ToolSchema};

pub use issues::{ISSUE_COMMENT_MARKER, PR_COMMENT_MARKER};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{0}' is not available for this action")]
    NotEnabled(&'static str),

    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: &'static str, message: String },

    #[error("Repository '{requested}' is outside the scope of this run ({allowed})")]
    RepositoryNotAllowed { requested: String, allowed: String },

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

/// All tools the agent can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetPullRequest,
    GetPullRequestFiles,
    UpdateOrCreatePrComment,
    CreatePullRequestReview,
    ApprovePullRequest,
    GetIssue,
    ListIssueComments,
    AddIssueComment,
    UpdateOrCreateIssueComment,
    AddLabelsToIssue,
    ListIssueLabels,
    CreateIssue,
    GetRepositoryInfo,
    GetRepositoryStats,
    GetRepositoryFileContent,
    ListRepositoryFiles,
    SearchCode,
}

impl ToolKind {
    pub const ALL: [ToolKind; 17] = [
        ToolKind::GetPullRequest,
        ToolKind::GetPullRequestFiles,
        ToolKind::UpdateOrCreatePrComment,
        ToolKind::CreatePullRequestReview,
        ToolKind::ApprovePullRequest,
        ToolKind::GetIssue,
        ToolKind::ListIssueComments,
        ToolKind::AddIssueComment,
        ToolKind::UpdateOrCreateIssueComment,
        ToolKind::AddLabelsToIssue,
        ToolKind::ListIssueLabels,
        ToolKind::CreateIssue,
        ToolKind::GetRepositoryInfo,
        ToolKind::GetRepositoryStats,
        ToolKind::GetRepositoryFileContent,
        ToolKind::ListRepositoryFiles,
        ToolKind::SearchCode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetPullRequest => "get_pull_request",
            ToolKind::GetPullRequestFiles => "get_pull_request_files",
            ToolKind::UpdateOrCreatePrComment => "update_or_create_pr_comment",
            ToolKind::CreatePullRequestReview => "create_pull_request_review",
            ToolKind::ApprovePullRequest => "approve_pull_request",
            ToolKind::GetIssue => "get_issue",
            ToolKind::ListIssueComments => "list_issue_comments",
            ToolKind::AddIssueComment => "add_issue_comment",
            ToolKind::UpdateOrCreateIssueComment => "update_or_create_issue_comment",
            ToolKind::AddLabelsToIssue => "add_labels_to_issue",
            ToolKind::ListIssueLabels => "list_issue_labels",
            ToolKind::CreateIssue => "create_issue",
            ToolKind::GetRepositoryInfo => "get_repository_info",
            ToolKind::GetRepositoryStats => "get_repository_stats",
            ToolKind::GetRepositoryFileContent => "get_repository_file_content",
            ToolKind::ListRepositoryFiles => "list_repository_files",
            ToolKind::SearchCode => "search_code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::GetPullRequest => pulls::GET_PULL_REQUEST,
            ToolKind::GetPullRequestFiles => pulls::GET_PULL_REQUEST_FILES,
            ToolKind::UpdateOrCreatePrComment => pulls::UPDATE_OR_CREATE_PR_COMMENT,
            ToolKind::CreatePullRequestReview => pulls::CREATE_PULL_REQUEST_REVIEW,
            ToolKind::ApprovePullRequest => pulls::APPROVE_PULL_REQUEST,
            ToolKind::GetIssue => issues::GET_ISSUE,
            ToolKind::ListIssueComments => issues::LIST_ISSUE_COMMENTS,
            ToolKind::AddIssueComment => issues::ADD_ISSUE_COMMENT,
            ToolKind::UpdateOrCreateIssueComment => issues::UPDATE_OR_CREATE_ISSUE_COMMENT,
            ToolKind::AddLabelsToIssue => issues::ADD_LABELS_TO_ISSUE,
            ToolKind::ListIssueLabels => issues::LIST_ISSUE_LABELS,
            ToolKind::CreateIssue => issues::CREATE_ISSUE,
            ToolKind::GetRepositoryInfo => repo::GET_REPOSITORY_INFO,
            ToolKind::GetRepositoryStats => repo::GET_REPOSITORY_STATS,
            ToolKind::GetRepositoryFileContent => repo::GET_REPOSITORY_FILE_CONTENT,
            ToolKind::ListRepositoryFiles => repo::LIST_REPOSITORY_FILES,
            ToolKind::SearchCode => repo::SEARCH_CODE,
        }
    }

    pub fn parameters_schema(self) -> Value {
        let (properties, required) = match self {
            ToolKind::GetPullRequest | ToolKind::GetPullRequestFiles => pulls::pr_number_schema(),
            ToolKind::UpdateOrCreatePrComment => pulls::pr_comment_schema(),
            ToolKind::CreatePullRequestReview => pulls::review_schema(),
            ToolKind::ApprovePullRequest => pulls::approve_schema(),
            ToolKind::GetIssue | ToolKind::ListIssueComments | ToolKind::ListIssueLabels => {
                issues::issue_number_schema()
            }
            ToolKind::AddIssueComment | ToolKind::UpdateOrCreateIssueComment => {
                issues::issue_comment_schema()
            }
            ToolKind::AddLabelsToIssue => issues::labels_schema(),
            ToolKind::CreateIssue => issues::create_issue_schema(),
            ToolKind::GetRepositoryInfo | ToolKind::GetRepositoryStats => (json!({}), vec![]),
            ToolKind::GetRepositoryFileContent => repo::file_content_schema(),
            ToolKind::ListRepositoryFiles => repo::list_files_schema(),
            ToolKind::SearchCode => repo::search_schema(),
        };

        let mut properties = properties;
        if let Value::Object(map) = &mut properties {
            map.insert(
                "repo".to_string(),
                json!({
                    "type": "string",
                    "description": "Repository name with owner (e.g., 'owner/repo'). Defaults to the repository this workflow runs in."
                }),
            );
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    pub fn schema(self) -> ToolSchema {
        ToolSchema {
            kind: "function",
            function: FunctionSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

/// Shared state every tool executes against.
#[derive(Clone)]
pub struct ToolContext {
    pub github: Arc<dyn GitHubApi>,
    pub repository: RepoName,
}

impl ToolContext {
    /// Resolve the optional `repo` argument; only the run's repository is allowed.
    pub(crate) fn repo(&self, requested: Option<&str>) -> Result<&RepoName, ToolError> {
        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            None => Ok(&self.repository),
            Some(r) if r.eq_ignore_ascii_case(&self.repository.to_string()) => Ok(&self.repository),
            Some(r) => Err(ToolError::RepositoryNotAllowed {
                requested: r.to_string(),
                allowed: self.repository.to_string(),
            }),
        }
    }
}

/// The tools enabled for one run.
pub struct ToolRegistry {
    ctx: ToolContext,
    enabled: Vec<ToolKind>,
}

impl ToolRegistry {
    pub fn new(github: Arc<dyn GitHubApi>, repository: RepoName, enabled: &[ToolKind]) -> Self {
        Self {
            ctx: ToolContext { github, repository },
            enabled: enabled.to_vec(),
        }
    }

    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.enabled.iter().map(|kind| kind.schema()).collect()
    }

    pub fn is_enabled(&self, kind: ToolKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Execute a tool by name with JSON-encoded arguments.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<Value, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        if !self.is_enabled(kind) {
            return Err(ToolError::NotEnabled(kind.name()));
        }

        tracing::info!(tool = kind.name(), "Tool call");
        tracing::debug!(tool = kind.name(), arguments, "Tool arguments");

        let ctx = &self.ctx;
        match kind {
            ToolKind::GetPullRequest => pulls::get_pull_request(ctx, decode(kind, arguments)?).await,
            ToolKind::GetPullRequestFiles => {
                pulls::get_pull_request_files(ctx, decode(kind, arguments)?).await
            }
            ToolKind::UpdateOrCreatePrComment => {
                pulls::update_or_create_pr_comment(ctx, decode(kind, arguments)?).await
            }
            ToolKind::CreatePullRequestReview => {
                let approval_enabled = self.is_enabled(ToolKind::ApprovePullRequest);
                pulls::create_pull_request_review(ctx, decode(kind, arguments)?, approval_enabled).await
            }
            ToolKind::ApprovePullRequest => {
                pulls::approve_pull_request(ctx, decode(kind, arguments)?).await
            }
            ToolKind::GetIssue => issues::get_issue(ctx, decode(kind, arguments)?).await,
            ToolKind::ListIssueComments => {
                issues::list_issue_comments(ctx, decode(kind, arguments)?).await
            }
            ToolKind::AddIssueComment => issues::add_issue_comment(ctx, decode(kind, arguments)?).await,
            ToolKind::UpdateOrCreateIssueComment => {
                issues::update_or_create_issue_comment(ctx, decode(kind, arguments)?).await
            }
            ToolKind::AddLabelsToIssue => {
                issues::add_labels_to_issue(ctx, decode(kind, arguments)?).await
            }
            ToolKind::ListIssueLabels => issues::list_issue_labels(ctx, decode(kind, arguments)?).await,
            ToolKind::CreateIssue => issues::create_issue(ctx, decode(kind, arguments)?).await,
            ToolKind::GetRepositoryInfo => repo::get_repository_info(ctx, decode(kind, arguments)?).await,
            ToolKind::GetRepositoryStats => {
                repo::get_repository_stats(ctx, decode(kind, arguments)?).await
            }
            ToolKind::GetRepositoryFileContent => {
                repo::get_repository_file_content(ctx, decode(kind, arguments)?).await
            }
            ToolKind::ListRepositoryFiles => {
                repo::list_repository_files(ctx, decode(kind, arguments)?).await
            }
            ToolKind::SearchCode => repo::search_code(ctx, decode(kind, arguments)?).await,
        }
    }
}

/// Decode model-supplied arguments into the tool's argument type.
fn decode<T: DeserializeOwned>(kind: ToolKind, arguments: &str) -> Result<T, ToolError> {
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name(),
        message: e.to_string(),
    })
}

/// Truncate on a char boundary, appending a marker when anything was cut.
pub(crate) fn truncate_text(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &s[..idx]),
        None => s.to_string(),
    }
}
