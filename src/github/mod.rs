//! GitHub integration.
//!
//! [`GitHubApi`] is the seam between the tools and GitHub's REST API; the
//! production implementation is [`GitHubClient`]. Event payload parsing lives
//! in [`events`].

mod client;
pub mod events;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::GitHubClient;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected GitHub response: {0}")]
    Decode(String),

    #[error("Invalid repository format. Expected 'owner/repo', got '{0}'")]
    InvalidRepository(String),
}

impl GitHubError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::Api { status: 404, .. })
    }
}

/// `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoName {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(GitHubError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub author: String,
    pub draft: bool,
    pub merged: bool,
    pub head_ref: String,
    pub head_sha: String,
    pub base_ref: String,
    pub base_sha: String,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub commits: u64,
    pub labels: Vec<String>,
    pub html_url: String,
}

/// File changed in a pull request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    #[serde(default)]
    pub patch: Option<String>,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub author: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub comments: u64,
    pub html_url: String,
    pub is_pull_request: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueComment {
    pub id: u64,
    pub body: String,
    pub author: String,
    pub html_url: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub default_branch: String,
    pub license: Option<String>,
    pub forks: u64,
    pub stars: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub subscribers: Option<u64>,
    pub size_kb: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub html_url: String,
}

/// Result of the contents endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Contents {
    File(FileContent),
    Directory { entries: Vec<ContentEntry> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileContent {
    pub path: String,
    pub size: u64,
    pub sha: String,
    pub content: String,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeSearchHit {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Review event type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    #[default]
    Comment,
}

/// Inline comment attached to a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReviewComment {
    /// The relative path of the file to comment on.
    pub path: String,
    /// The comment body.
    pub body: String,
    /// The line in the diff to comment on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// LEFT or RIGHT side of the diff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewRequest {
    pub body: String,
    pub event: ReviewEvent,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<ReviewComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: u64,
    pub state: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// GitHub operations used by the tools and the event loader.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get_pull_request(&self, repo: &RepoName, number: u64) -> Result<PullRequest, GitHubError>;

    async fn list_pull_request_files(
        &self,
        repo: &RepoName,
        number: u64,
    ) -> Result<Vec<ChangedFile>, GitHubError>;

    async fn create_review(
        &self,
        repo: &RepoName,
        number: u64,
        review: &ReviewRequest,
    ) -> Result<Review, GitHubError>;

    async fn get_issue(&self, repo: &RepoName, number: u64) -> Result<Issue, GitHubError>;

    /// Comments on an issue or pull request conversation.
    async fn list_issue_comments(
        &self,
        repo: &RepoName,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError>;

    async fn create_issue_comment(
        &self,
        repo: &RepoName,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError>;

    async fn update_issue_comment(
        &self,
        repo: &RepoName,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError>;

    /// Returns the full label set after adding.
    async fn add_labels(
        &self,
        repo: &RepoName,
        number: u64,
        labels: &[String],
    ) -> Result<Vec<String>, GitHubError>;

    async fn create_issue(&self, repo: &RepoName, issue: &NewIssue) -> Result<Issue, GitHubError>;

    async fn get_repository(&self, repo: &RepoName) -> Result<Repository, GitHubError>;

    async fn get_contents(
        &self,
        repo: &RepoName,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, GitHubError>;

    async fn search_code(&self, repo: &RepoName, query: &str) -> Result<Vec<CodeSearchHit>, GitHubError>;

    /// Login the token acts as. `None` when the token cannot read `/user`,
    /// which is the case for the workflow `GITHUB_TOKEN`.
    async fn authenticated_login(&self) -> Result<Option<String>, GitHubError>;
}
