//! Issue and comment tools.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{truncate_text, ToolContext, ToolError};
use crate::github::{NewIssue, RepoName};

/// Hidden marker identifying the pull request summary comment.
pub const PR_COMMENT_MARKER: &str = "<!-- github-agent-action:pr-review -->";
/// Hidden marker identifying the issue analysis comment.
pub const ISSUE_COMMENT_MARKER: &str = "<!-- github-agent-action:issue-analyze -->";

const MAX_COMMENT_CHARS: usize = 4_000;

pub(super) const GET_ISSUE: &str =
    "Get details of an issue: title, body, author, state, labels and assignees.";
pub(super) const LIST_ISSUE_COMMENTS: &str =
    "List the comments on an issue or pull request conversation, oldest first.";
pub(super) const ADD_ISSUE_COMMENT: &str = "Post a new comment on an issue.";
pub(super) const UPDATE_OR_CREATE_ISSUE_COMMENT: &str =
    "Post the analysis as a comment on the issue. If an analysis comment from a previous run exists it is updated in place instead of posting a new one.";
pub(super) const ADD_LABELS_TO_ISSUE: &str =
    "Add labels to an issue. Existing labels are kept.";
pub(super) const LIST_ISSUE_LABELS: &str = "List the labels currently applied to an issue.";
pub(super) const CREATE_ISSUE: &str = "Create a new issue in the repository.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct IssueNumberArgs {
    #[serde(default)]
    repo: Option<String>,
    issue_number: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct IssueCommentArgs {
    #[serde(default)]
    repo: Option<String>,
    issue_number: u64,
    body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct LabelsArgs {
    #[serde(default)]
    repo: Option<String>,
    issue_number: u64,
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct CreateIssueArgs {
    #[serde(default)]
    repo: Option<String>,
    title: String,
    body: String,
    #[serde(default)]
    labels: Vec<String>,
}

pub(super) fn issue_number_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "issue_number": {"type": "integer", "description": "Issue number"}
        }),
        vec!["issue_number"],
    )
}

pub(super) fn issue_comment_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "issue_number": {"type": "integer", "description": "Issue number"},
            "body": {"type": "string", "description": "Comment body in Markdown"}
        }),
        vec!["issue_number", "body"],
    )
}

pub(super) fn labels_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "issue_number": {"type": "integer", "description": "Issue number"},
            "labels": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Labels to add"
            }
        }),
        vec!["issue_number", "labels"],
    )
}

pub(super) fn create_issue_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "title": {"type": "string", "description": "Issue title"},
            "body": {"type": "string", "description": "Issue body in Markdown"},
            "labels": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Labels to apply"
            }
        }),
        vec!["title", "body"],
    )
}

/// Edit our own comment that starts with `marker`, or create one.
///
/// A comment counts as ours when its author is the login the token acts as.
/// Tokens that cannot report a login (the workflow `GITHUB_TOKEN`) post as an
/// app, so any `[bot]` author is accepted then.
pub(super) async fn upsert_marked_comment(
    ctx: &ToolContext,
    repo: &RepoName,
    number: u64,
    marker: &str,
    body: &str,
) -> Result<Value, ToolError> {
    let body = if body.starts_with(marker) {
        body.to_string()
    } else {
        format!("{}\n{}", marker, body)
    };

    let marked: Vec<_> = ctx
        .github
        .list_issue_comments(repo, number)
        .await?
        .into_iter()
        .filter(|c| c.body.starts_with(marker))
        .collect();

    let existing = if marked.is_empty() {
        None
    } else {
        let login = ctx.github.authenticated_login().await?;
        marked
            .into_iter()
            .find(|c| is_own_comment(&c.author, login.as_deref()))
    };

    let (action, comment) = match existing {
        Some(previous) => {
            tracing::debug!(comment_id = previous.id, "Updating existing comment");
            ("updated", ctx.github.update_issue_comment(repo, previous.id, &body).await?)
        }
        None => ("created", ctx.github.create_issue_comment(repo, number, &body).await?),
    };

    tracing::info!(number, action, comment_id = comment.id, "Comment posted");
    Ok(json!({
        "action": action,
        "comment_id": comment.id,
        "html_url": comment.html_url
    }))
}

fn is_own_comment(author: &str, login: Option<&str>) -> bool {
    match login {
        Some(login) => author == login,
        None => author.ends_with("[bot]"),
    }
}

pub(super) async fn get_issue(ctx: &ToolContext, args: IssueNumberArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let issue = ctx.github.get_issue(repo, args.issue_number).await?;
    Ok(json!(issue))
}

pub(super) async fn list_issue_comments(
    ctx: &ToolContext,
    args: IssueNumberArgs,
) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let comments = ctx.github.list_issue_comments(repo, args.issue_number).await?;

    let comments: Vec<Value> = comments
        .into_iter()
        .map(|c| {
            json!({
                "id": c.id,
                "author": c.author,
                "created_at": c.created_at,
                "body": truncate_text(&c.body, MAX_COMMENT_CHARS),
            })
        })
        .collect();

    Ok(json!({ "total": comments.len(), "comments": comments }))
}

pub(super) async fn add_issue_comment(ctx: &ToolContext, args: IssueCommentArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let comment = ctx
        .github
        .create_issue_comment(repo, args.issue_number, &args.body)
        .await?;
    Ok(json!({ "comment_id": comment.id, "html_url": comment.html_url }))
}

pub(super) async fn update_or_create_issue_comment(
    ctx: &ToolContext,
    args: IssueCommentArgs,
) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    upsert_marked_comment(ctx, repo, args.issue_number, ISSUE_COMMENT_MARKER, &args.body).await
}

pub(super) async fn add_labels_to_issue(ctx: &ToolContext, args: LabelsArgs) -> Result<Value, ToolError> {
    let labels: Vec<String> = args
        .labels
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(ToolError::InvalidArguments {
            tool: "add_labels_to_issue",
            message: "at least one label is required".to_string(),
        });
    }

    let repo = ctx.repo(args.repo.as_deref())?;
    let current = ctx.github.add_labels(repo, args.issue_number, &labels).await?;
    Ok(json!({ "added": labels, "labels": current }))
}

pub(super) async fn list_issue_labels(ctx: &ToolContext, args: IssueNumberArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let issue = ctx.github.get_issue(repo, args.issue_number).await?;
    Ok(json!({ "issue_number": issue.number, "labels": issue.labels }))
}

pub(super) async fn create_issue(ctx: &ToolContext, args: CreateIssueArgs) -> Result<Value, ToolError> {
    if args.title.trim().is_empty() {
        return Err(ToolError::InvalidArguments {
            tool: "create_issue",
            message: "title must not be empty".to_string(),
        });
    }

    let repo = ctx.repo(args.repo.as_deref())?;
    let issue = ctx
        .github
        .create_issue(
            repo,
            &NewIssue {
                title: args.title,
                body: args.body,
                labels: args.labels,
            },
        )
        .await?;

    Ok(json!({ "number": issue.number, "html_url": issue.html_url }))
}
