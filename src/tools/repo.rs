//! Repository tools: metadata, file contents and code search.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{truncate_text, ToolContext, ToolError};
use crate::github::{ContentEntry, Contents};

/// File contents longer than this are cut before they reach the model.
const MAX_FILE_CHARS: usize = 20_000;
const MAX_SEARCH_RESULTS: usize = 30;

pub(super) const GET_REPOSITORY_INFO: &str =
    "Get repository metadata: description, primary language, topics, default branch and license.";
pub(super) const GET_REPOSITORY_STATS: &str =
    "Get repository statistics: stars, forks, watchers, open issues and size.";
pub(super) const GET_REPOSITORY_FILE_CONTENT: &str =
    "Read a file from the repository at the given path, optionally at a specific branch, tag or commit. For a directory the entries are returned instead.";
pub(super) const LIST_REPOSITORY_FILES: &str =
    "List files and directories at a path in the repository (the root when no path is given).";
pub(super) const SEARCH_CODE: &str =
    "Search the repository's code. Returns matching file paths.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RepoArgs {
    #[serde(default)]
    repo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct FileContentArgs {
    #[serde(default)]
    repo: Option<String>,
    path: String,
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ListFilesArgs {
    #[serde(default)]
    repo: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SearchArgs {
    #[serde(default)]
    repo: Option<String>,
    query: String,
}

pub(super) fn file_content_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "path": {"type": "string", "description": "File path relative to the repository root"},
            "ref": {"type": "string", "description": "Branch, tag or commit SHA (default: the default branch)"}
        }),
        vec!["path"],
    )
}

pub(super) fn list_files_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "path": {"type": "string", "description": "Directory path relative to the repository root (default: root)"},
            "ref": {"type": "string", "description": "Branch, tag or commit SHA (default: the default branch)"}
        }),
        vec![],
    )
}

pub(super) fn search_schema() -> (Value, Vec<&'static str>) {
    (
        json!({
            "query": {"type": "string", "description": "Search terms, using GitHub code search syntax"}
        }),
        vec!["query"],
    )
}

pub(super) async fn get_repository_info(ctx: &ToolContext, args: RepoArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let info = ctx.github.get_repository(repo).await?;

    Ok(json!({
        "full_name": info.full_name,
        "description": info.description,
        "language": info.language,
        "topics": info.topics,
        "default_branch": info.default_branch,
        "license": info.license,
        "created_at": info.created_at,
        "updated_at": info.updated_at,
        "html_url": info.html_url
    }))
}

pub(super) async fn get_repository_stats(ctx: &ToolContext, args: RepoArgs) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let info = ctx.github.get_repository(repo).await?;

    Ok(json!({
        "full_name": info.full_name,
        "stars": info.stars,
        "forks": info.forks,
        "watchers": info.watchers,
        "subscribers": info.subscribers,
        "open_issues": info.open_issues,
        "size_kb": info.size_kb
    }))
}

pub(super) async fn get_repository_file_content(
    ctx: &ToolContext,
    args: FileContentArgs,
) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let path = args.path.trim_matches('/');

    match ctx.github.get_contents(repo, path, args.git_ref.as_deref()).await? {
        Contents::File(file) => Ok(json!({
            "type": "file",
            "path": file.path,
            "size": file.size,
            "sha": file.sha,
            "content": truncate_text(&file.content, MAX_FILE_CHARS)
        })),
        Contents::Directory { entries } => Ok(json!({
            "type": "directory",
            "path": path,
            "entries": entries.iter().map(entry_json).collect::<Vec<_>>()
        })),
    }
}

fn entry_json(entry: &ContentEntry) -> Value {
    json!({ "name": entry.name, "path": entry.path, "type": entry.kind, "size": entry.size })
}

pub(super) async fn list_repository_files(
    ctx: &ToolContext,
    args: ListFilesArgs,
) -> Result<Value, ToolError> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let path = args.path.as_deref().unwrap_or("").trim_matches('/');

    let entries: Vec<Value> = match ctx.github.get_contents(repo, path, args.git_ref.as_deref()).await? {
        Contents::Directory { entries } => entries.iter().map(entry_json).collect(),
        Contents::File(file) => vec![json!({
            "name": file.path.rsplit('/').next().unwrap_or(&file.path),
            "path": file.path,
            "type": "file",
            "size": file.size
        })],
    };

    Ok(json!({ "path": path, "total": entries.len(), "entries": entries }))
}

pub(super) async fn search_code(ctx: &ToolContext, args: SearchArgs) -> Result<Value, ToolError> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(ToolError::InvalidArguments {
            tool: "search_code",
            message: "query must not be empty".to_string(),
        });
    }

    let repo = ctx.repo(args.repo.as_deref())?;
    let hits = ctx.github.search_code(repo, query).await?;
    let total = hits.len();
    let results: Vec<Value> = hits
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|h| json!({ "path": h.path, "name": h.name, "html_url": h.html_url }))
        .collect();

    Ok(json!({ "query": query, "total": total, "results": results }))
}
