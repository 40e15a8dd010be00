//! Pull request tools.

use serde::Deserialize;
use serde_json::{json, Value};

use super::issues::upsert_marked_comment;
use super::{truncate_text, ToolContext, ToolError, PR_COMMENT_MARKER};
use crate::github::{ReviewComment, ReviewEvent, ReviewRequest};

/// Patches longer than this are cut before they reach the model.
const MAX_PATCH_CHARS: usize = 10_000;

pub(super) const GET_PULL_REQUEST: &str =
    "Get details of a pull request: title, description, author, branches, state and size.";
pub(super) const GET_PULL_REQUEST_FILES: &str =
    "List the files changed in a pull request, with status, line counts and the diff patch for each file.";
pub(super) const UPDATE_OR_CREATE_PR_COMMENT: &str =
    "Post the review summary as a comment on the pull request. If a summary comment from a previous run exists it is updated in place instead of posting a new one.";
pub(super) const CREATE_PULL_REQUEST_REVIEW: &str =
    "Submit a pull request review with an overall body, an event (COMMENT, REQUEST_CHANGES or APPROVE) and optional inline comments on specific lines. APPROVE is only accepted when approval is enabled for this run.";
pub(super) const APPROVE_PULL_REQUEST: &str =
    "Approve the pull request. Only use this when the changes are correct and ready to merge.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct PrNumberArgs {
    #[serde(default)]
    repo: Option<String>,
    pr_number: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct PrCommentArgs {
    #[serde(default)]
    repo: Option<String>,
    pr_number: u64,
    body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ReviewArgs {
    #[serde(default)]
    repo: Option<String>,
    pr_number: u64,
    body: String,
    #[serde(default)]
    event: ReviewEvent,
    #[serde(default)]
    comments: Vec<ReviewComment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ApproveArgs {
    #[serde(default)]
    repo: Option<String>,
    pr_number: u64,
    #[serde(default)]
    body: Option<String>,
}

pub(super) fn pr_number_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "pr_number": {"type": "integer", "description": "Pull request number"}
        }),
        vec!["pr_number"],
    )
}

pub(super) fn pr_comment_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "pr_number": {"type": "integer", "description": "Pull request number"},
            "body": {"type": "string", "description": "Comment body in Markdown"}
        }),
        vec!["pr_number", "body"],
    )
}

pub(super) fn review_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "pr_number": {"type": "integer", "description": "Pull request number"},
            "body": {"type": "string", "description": "Overall review body in Markdown"},
            "event": {
                "type": "string",
                "enum": ["COMMENT", "REQUEST_CHANGES", "APPROVE"],
                "description": "Review verdict (default: COMMENT)"
            },
            "comments": {
                "type": "array",
                "description": "Inline comments on specific lines of the diff",
                "items": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "File path relative to the repository root"},
                        "body": {"type": "string", "description": "Comment text"},
                        "line": {"type": "integer", "description": "Line number in the new version of the file"},
                        "side": {"type": "string", "enum": ["LEFT", "RIGHT"]}
                    },
                    "required": ["path", "body"],
                    "additionalProperties": false
                }
            }
        }),
        vec!["pr_number", "body"],
    )
}

pub(super) fn approve_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "pr_number": {"type": "integer", "description": "Pull request number"},
            "body": {"type": "string", "description": "Optional approval message"}
        }),
        vec!["pr_number"],
    )
}

pub(super) async fn get_pull_request(ctx: &ToolContext, args: PrNumberArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let pr = ctx.github.get_pull_request(repo, args.pr_number).await?;
    Ok(json!(pr))
}

pub(super) async fn get_pull_request_files(
    ctx: &ToolContext,
    args: PrNumberArgs,
) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let files = ctx.github.list_pull_request_files(repo, args.pr_number).await?;

    let files: Vec<Value> = files
        .into_iter()
        .map(|f| {
            json!({
                "filename": f.filename,
                "status": f.status,
                "additions": f.additions,
                "deletions": f.deletions,
                "changes": f.changes,
                "previous_filename": f.previous_filename,
                "patch": f.patch.map(|p| truncate_text(&p, MAX_PATCH_CHARS)),
            })
        })
        .collect();

    Ok(json!({
        "pr_number": args.pr_number,
        "total": files.len(),
        "files": files
    }))
}

pub(super) async fn update_or_create_pr_comment(
    ctx: &ToolContext,
    args: PrCommentArgs,
) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    upsert_marked_comment(ctx, repo, args.pr_number, PR_COMMENT_MARKER, &args.body).await
}

pub(super) async fn create_pull_request_review(
    ctx: &ToolContext,
    args: ReviewArgs,
    approval_enabled: bool,
) -> Result<Value, ToolError> {
    if args.event == ReviewEvent::Approve && !approval_enabled {
        return Err(ToolError::InvalidArguments {
            tool: "create_pull_request_review",
            message: "approving is not enabled for this run".to_string(),
        });
    }
    let repo = ctx.repo(args.repo.as_deref())?;

    let request = ReviewRequest {
        body: args.body,
        event: args.event,
        comments: args.comments,
    };
    let review = ctx.github.create_review(repo, args.pr_number, &request).await?;

    Ok(json!({
        "id": review.id,
        "state": review.state,
        "html_url": review.html_url,
        "inline_comments": request.comments.len()
    }))
}

pub(super) async fn approve_pull_request(ctx: &ToolContext, args: ApproveArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let request = ReviewRequest {
        body: args.body.unwrap_or_else(|| "Approved.".to_string()),
        event: ReviewEvent::Approve,
        comments: Vec::new(),
    };
    let review = ctx.github.create_review(repo, args.pr_number, &request).await?;

    tracing::info!(pr = args.pr_number, "Pull request approved");
    Ok(json!({
        "id": review.id,
        "state": review.state,
        "html_url": review.html_url
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::github::testing::{sample_file, sample_pull_request, FakeGitHub};
    use crate::tools::{ToolKind, ToolRegistry, PR_COMMENT_MARKER};

    fn registry(github: &Arc<FakeGitHub>) -> ToolRegistry {
        ToolRegistry::new(github.clone(), "octo/widgets".parse().unwrap(), &ToolKind::ALL)
    }

    #[tokio::test]
    async fn files_include_truncated_patches() {
        let mut big = sample_file("src/big.rs", 5000);
        big.patch = Some("+x\n".repeat(6000));
        let github = Arc::new(
            FakeGitHub::new()
                .with_pull_request(sample_pull_request(7), vec![sample_file("src/lib.rs", 4), big]),
        );

        let result = registry(&github)
            .execute("get_pull_request_files", r#"{"pr_number": 7}"#)
            .await
            .unwrap();

        assert_eq!(result["total"], 2);
        assert_eq!(result["files"][0]["filename"], "src/lib.rs");
        let patch = result["files"][1]["patch"].as_str().unwrap();
        assert!(patch.ends_with("[truncated]"));
        assert!(patch.len() < 18_000);
    }

    #[tokio::test]
    async fn summary_comment_is_updated_in_place() {
        let github = Arc::new(FakeGitHub::new().with_comment(
            7,
            "github-actions[bot]",
            &format!("{}\nOld summary", PR_COMMENT_MARKER),
        ));
        let registry = registry(&github);

        let result = registry
            .execute(
                "update_or_create_pr_comment",
                r#"{"pr_number": 7, "body": "New summary"}"#,
            )
            .await
            .unwrap();

        assert_eq!(result["action"], "updated");
        let comments = github.comments_on(7);
        assert_eq!(comments.len(), 1);
        assert!(comments[0].body.contains("New summary"));
        assert!(comments[0].body.contains(PR_COMMENT_MARKER));
    }

    #[tokio::test]
    async fn human_comment_quoting_the_marker_is_not_overwritten() {
        let github = Arc::new(
            FakeGitHub::new()
                .with_comment(
                    7,
                    "carol",
                    &format!("FYI the bot tags its comment with `{}`", PR_COMMENT_MARKER),
                )
                .with_comment(7, "github-actions[bot]", &format!("{}\nOld summary", PR_COMMENT_MARKER)),
        );

        registry(&github)
            .execute(
                "update_or_create_pr_comment",
                r#"{"pr_number": 7, "body": "New summary"}"#,
            )
            .await
            .unwrap();

        let comments = github.comments_on(7);
        assert_eq!(comments[0].author, "carol");
        assert!(comments[0].body.starts_with("FYI"));
        assert_eq!(comments[1].body, format!("{}\nNew summary", PR_COMMENT_MARKER));
    }

    #[tokio::test]
    async fn summary_comment_is_created_once_then_reused() {
        let github = Arc::new(FakeGitHub::new().with_comment(7, "carol", "LGTM"));
        let registry = registry(&github);

        let first = registry
            .execute("update_or_create_pr_comment", r#"{"pr_number": 7, "body": "Run 1"}"#)
            .await
            .unwrap();
        let second = registry
            .execute("update_or_create_pr_comment", r#"{"pr_number": 7, "body": "Run 2"}"#)
            .await
            .unwrap();

        assert_eq!(first["action"], "created");
        assert_eq!(second["action"], "updated");
        assert_eq!(first["comment_id"], second["comment_id"]);

        let comments = github.comments_on(7);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "LGTM");
        assert!(comments[1].body.ends_with("Run 2"));
    }

    #[tokio::test]
    async fn review_with_inline_comments() {
        let github = Arc::new(FakeGitHub::new());
        let result = registry(&github)
            .execute(
                "create_pull_request_review",
                r#"{
                    "pr_number": 7,
                    "body": "A few issues",
                    "event": "REQUEST_CHANGES",
                    "comments": [{"path": "src/lib.rs", "line": 10, "body": "unwrap can panic"}]
                }"#,
            )
            .await
            .unwrap();

        assert_eq!(result["state"], "CHANGES_REQUESTED");
        assert_eq!(result["inline_comments"], 1);

        let state = github.state.lock().unwrap();
        let (number, review) = &state.reviews[0];
        assert_eq!(*number, 7);
        assert_eq!(review.comments[0].line, Some(10));
    }

    #[tokio::test]
    async fn review_approval_follows_auto_approve() {
        let github = Arc::new(FakeGitHub::new());
        let args = r#"{"pr_number": 7, "body": "ok", "event": "APPROVE"}"#;

        let without_approval = ToolRegistry::new(
            github.clone(),
            "octo/widgets".parse().unwrap(),
            &[ToolKind::CreatePullRequestReview],
        );
        let err = without_approval
            .execute("create_pull_request_review", args)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not enabled"));
        assert_eq!(github.call_count(), 0);

        let result = registry(&github)
            .execute("create_pull_request_review", args)
            .await
            .unwrap();
        assert_eq!(result["state"], "APPROVED");
    }

    #[tokio::test]
    async fn approve_submits_approve_event() {
        let github = Arc::new(FakeGitHub::new());
        let result = registry(&github)
            .execute("approve_pull_request", r#"{"pr_number": 7}"#)
            .await
            .unwrap();
        assert_eq!(result["state"], "APPROVED");
    }
}
