//! GitHub event payload parsing.
//!
//! Reads the payload the runner writes to `GITHUB_EVENT_PATH` and extracts the
//! fields the action needs. Which fields are mandatory depends on the action
//! type and is enforced by the context loader.

use std::path::Path;

use serde_json::Value;

use super::RepoName;
use crate::config::ConfigError;

/// Fields extracted from an event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    /// Repository the workflow runs in.
    pub repository: RepoName,
    /// Activity type (`opened`, `synchronize`, `labeled`, ...).
    pub action: Option<String>,
    /// `sender.login`.
    pub sender: Option<String>,
    pub pull_request: Option<PullRequestRef>,
    pub issue: Option<IssueRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestRef {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub head_ref: String,
    pub head_sha: String,
    pub base_ref: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
    pub is_pull_request: bool,
}

/// Read and decode the payload file.
pub fn read_payload(path: &Path) -> Result<Value, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::EventRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw)
        .map_err(|e| ConfigError::MalformedEvent(format!("payload is not valid JSON: {}", e)))
}

/// Extract the repository and subject references from a payload.
pub fn parse_payload(value: &Value) -> Result<EventPayload, ConfigError> {
    if !value.is_object() {
        return Err(ConfigError::MalformedEvent(
            "payload must be a JSON object".to_string(),
        ));
    }

    let full_name = value["repository"]["full_name"]
        .as_str()
        .ok_or_else(|| ConfigError::MalformedEvent("missing repository.full_name".to_string()))?;
    let repository: RepoName = full_name
        .parse()
        .map_err(|e: super::GitHubError| ConfigError::MalformedEvent(e.to_string()))?;

    Ok(EventPayload {
        repository,
        action: value["action"].as_str().map(String::from),
        sender: value["sender"]["login"].as_str().map(String::from),
        pull_request: parse_pull_request(value),
        issue: parse_issue(value),
    })
}

fn parse_pull_request(value: &Value) -> Option<PullRequestRef> {
    let pr = value.get("pull_request")?;
    let number = pr["number"].as_u64().or_else(|| value["number"].as_u64())?;

    Some(PullRequestRef {
        number,
        title: pr["title"].as_str().unwrap_or("").to_string(),
        body: pr["body"].as_str().map(String::from),
        head_ref: pr["head"]["ref"].as_str().unwrap_or("").to_string(),
        head_sha: pr["head"]["sha"].as_str().unwrap_or("").to_string(),
        base_ref: pr["base"]["ref"].as_str().unwrap_or("").to_string(),
    })
}

fn parse_issue(value: &Value) -> Option<IssueRef> {
    let issue = value.get("issue")?;
    let number = issue["number"].as_u64()?;

    let labels: Vec<String> = issue["labels"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|l| l["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Some(IssueRef {
        number,
        title: issue["title"].as_str().unwrap_or("").to_string(),
        body: issue["body"].as_str().map(String::from),
        labels,
        is_pull_request: issue.get("pull_request").is_some(),
    })
}
