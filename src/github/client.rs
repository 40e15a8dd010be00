//! GitHub REST API client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    ChangedFile, CodeSearchHit, ContentEntry, Contents, FileContent, GitHubApi, GitHubError, Issue,
    IssueComment, NewIssue, PullRequest, RepoName, Repository, Review, ReviewRequest,
};

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 30;

/// Authenticated GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, GitHubError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("github-agent-action/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn repo_url(&self, repo: &RepoName, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.base_url, repo.owner, repo.name, suffix)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, GitHubError> {
        tracing::debug!(%method, url, "GitHub request");

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        self.send(Method::GET, url, None::<&()>).await
    }

    /// Follow `page=` pagination until a short page is returned.
    async fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, GitHubError> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let page_url = format!("{}{}per_page={}&page={}", url, separator, PER_PAGE, page);
            let batch: Vec<T> = self.get(&page_url).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_pull_request(&self, repo: &RepoName, number: u64) -> Result<PullRequest, GitHubError> {
        let pr: ApiPullRequest = self.get(&self.repo_url(repo, &format!("/pulls/{}", number))).await?;

        Ok(PullRequest {
            number: pr.number,
            title: pr.title,
            body: pr.body,
            state: pr.state,
            author: pr.user.login,
            draft: pr.draft.unwrap_or(false),
            merged: pr.merged.unwrap_or(false),
            head_ref: pr.head.ref_name,
            head_sha: pr.head.sha,
            base_ref: pr.base.ref_name,
            base_sha: pr.base.sha,
            additions: pr.additions.unwrap_or(0),
            deletions: pr.deletions.unwrap_or(0),
            changed_files: pr.changed_files.unwrap_or(0),
            commits: pr.commits.unwrap_or(0),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            html_url: pr.html_url,
        })
    }

    async fn list_pull_request_files(
        &self,
        repo: &RepoName,
        number: u64,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        self.get_paginated(&self.repo_url(repo, &format!("/pulls/{}/files", number)))
            .await
    }

    async fn create_review(
        &self,
        repo: &RepoName,
        number: u64,
        review: &ReviewRequest,
    ) -> Result<Review, GitHubError> {
        self.send(
            Method::POST,
            &self.repo_url(repo, &format!("/pulls/{}/reviews", number)),
            Some(review),
        )
        .await
    }

    async fn get_issue(&self, repo: &RepoName, number: u64) -> Result<Issue, GitHubError> {
        let issue: ApiIssue = self.get(&self.repo_url(repo, &format!("/issues/{}", number))).await?;
        Ok(issue.into())
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoName,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        let comments: Vec<ApiComment> = self
            .get_paginated(&self.repo_url(repo, &format!("/issues/{}/comments", number)))
            .await?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn create_issue_comment(
        &self,
        repo: &RepoName,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError> {
        let comment: ApiComment = self
            .send(
                Method::POST,
                &self.repo_url(repo, &format!("/issues/{}/comments", number)),
                Some(&serde_json::json!({ "body": body })),
            )
            .await?;
        Ok(comment.into())
    }

    async fn update_issue_comment(
        &self,
        repo: &RepoName,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError> {
        let comment: ApiComment = self
            .send(
                Method::PATCH,
                &self.repo_url(repo, &format!("/issues/comments/{}", comment_id)),
                Some(&serde_json::json!({ "body": body })),
            )
            .await?;
        Ok(comment.into())
    }

    async fn add_labels(
        &self,
        repo: &RepoName,
        number: u64,
        labels: &[String],
    ) -> Result<Vec<String>, GitHubError> {
        let labels: Vec<ApiLabel> = self
            .send(
                Method::POST,
                &self.repo_url(repo, &format!("/issues/{}/labels", number)),
                Some(&serde_json::json!({ "labels": labels })),
            )
            .await?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    async fn create_issue(&self, repo: &RepoName, issue: &NewIssue) -> Result<Issue, GitHubError> {
        let created: ApiIssue = self
            .send(Method::POST, &self.repo_url(repo, "/issues"), Some(issue))
            .await?;
        Ok(created.into())
    }

    async fn get_repository(&self, repo: &RepoName) -> Result<Repository, GitHubError> {
        let r: ApiRepository = self.get(&self.repo_url(repo, "")).await?;

        Ok(Repository {
            name: r.name,
            full_name: r.full_name,
            description: r.description,
            language: r.language,
            topics: r.topics,
            default_branch: r.default_branch,
            license: r.license.map(|l| l.name),
            forks: r.forks_count,
            stars: r.stargazers_count,
            watchers: r.watchers_count,
            open_issues: r.open_issues_count,
            subscribers: r.subscribers_count,
            size_kb: r.size,
            created_at: r.created_at,
            updated_at: r.updated_at,
            html_url: r.html_url,
        })
    }

    async fn get_contents(
        &self,
        repo: &RepoName,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, GitHubError> {
        let mut url = self.repo_url(repo, &format!("/contents/{}", encode_path(path)));
        if let Some(r) = git_ref {
            url.push_str(&format!("?ref={}", urlencoding::encode(r)));
        }

        let value: serde_json::Value = self.get(&url).await?;
        decode_contents(value)
    }

    async fn search_code(&self, repo: &RepoName, query: &str) -> Result<Vec<CodeSearchHit>, GitHubError> {
        let q = format!("{} repo:{}", query, repo);
        let url = format!(
            "{}/search/code?q={}&per_page=30",
            self.base_url,
            urlencoding::encode(&q)
        );
        let results: ApiSearchResults = self.get(&url).await?;
        Ok(results.items)
    }

    async fn authenticated_login(&self) -> Result<Option<String>, GitHubError> {
        match self.get::<ApiUser>(&format!("{}/user", self.base_url)).await {
            Ok(user) => Ok(Some(user.login)),
            // installation tokens are not allowed to read /user
            Err(GitHubError::Api { status: 401 | 403 | 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Percent-encode each path segment, keeping separators.
fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_contents(value: serde_json::Value) -> Result<Contents, GitHubError> {
    if value.is_array() {
        let entries: Vec<ContentEntry> =
            serde_json::from_value(value).map_err(|e| GitHubError::Decode(e.to_string()))?;
        return Ok(Contents::Directory { entries });
    }

    let file: ApiFile = serde_json::from_value(value).map_err(|e| GitHubError::Decode(e.to_string()))?;
    let content = match (file.encoding.as_deref(), file.content) {
        (Some("base64"), Some(encoded)) => {
            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| GitHubError::Decode(format!("invalid base64 content: {}", e)))?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        (_, Some(raw)) => raw,
        (_, None) => String::new(),
    };

    Ok(Contents::File(FileContent {
        path: file.path,
        size: file.size,
        sha: file.sha,
        content,
        html_url: file.html_url,
    }))
}

// GitHub API response types

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    user: ApiUser,
    draft: Option<bool>,
    merged: Option<bool>,
    head: ApiRef,
    base: ApiRef,
    additions: Option<u64>,
    deletions: Option<u64>,
    changed_files: Option<u64>,
    commits: Option<u64>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    user: ApiUser,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    #[serde(default)]
    assignees: Vec<ApiUser>,
    #[serde(default)]
    comments: u64,
    html_url: String,
    pull_request: Option<serde_json::Value>,
}

impl From<ApiIssue> for Issue {
    fn from(issue: ApiIssue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            state: issue.state,
            author: issue.user.login,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            assignees: issue.assignees.into_iter().map(|u| u.login).collect(),
            comments: issue.comments,
            html_url: issue.html_url,
            is_pull_request: issue.pull_request.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    user: Option<ApiUser>,
    html_url: String,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl From<ApiComment> for IssueComment {
    fn from(comment: ApiComment) -> Self {
        Self {
            id: comment.id,
            body: comment.body.unwrap_or_default(),
            author: comment.user.map(|u| u.login).unwrap_or_default(),
            html_url: comment.html_url,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiLicense {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    full_name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    default_branch: String,
    license: Option<ApiLicense>,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    watchers_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    subscribers_count: Option<u64>,
    #[serde(default)]
    size: u64,
    created_at: Option<String>,
    updated_at: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    path: String,
    #[serde(default)]
    size: u64,
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResults {
    #[serde(default)]
    items: Vec<CodeSearchHit>,
}
