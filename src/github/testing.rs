//! In-memory [`GitHubApi`] used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ChangedFile, CodeSearchHit, ContentEntry, Contents, FileContent, GitHubApi, GitHubError, Issue, IssueComment,
    NewIssue, PullRequest, RepoName, Repository, Review, ReviewRequest,
};

#[derive(Default)]
pub(crate) struct FakeState {
    pub pull_requests: HashMap<u64, PullRequest>,
    pub files: HashMap<u64, Vec<ChangedFile>>,
    pub issues: HashMap<u64, Issue>,
    pub comments: HashMap<u64, Vec<IssueComment>>,
    pub reviews: Vec<(u64, ReviewRequest)>,
    pub created_issues: Vec<NewIssue>,
    pub file_contents: HashMap<String, String>,
    pub next_id: u64,
}

/// Fake GitHub backed by a mutex-guarded state; every call is logged.
#[derive(Default)]
pub(crate) struct FakeGitHub {
    pub state: Mutex<FakeState>,
    pub calls: Mutex<Vec<String>>,
    /// When set, every call fails with this HTTP status.
    pub fail_with: Option<u16>,
    /// Login reported for the token; `None` mimics `GITHUB_TOKEN`.
    pub login: Option<String>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    pub fn with_login(mut self, login: &str) -> Self {
        self.login = Some(login.to_string());
        self
    }

    pub fn with_pull_request(self, pr: PullRequest, files: Vec<ChangedFile>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.files.insert(pr.number, files);
            state.pull_requests.insert(pr.number, pr);
        }
        self
    }

    pub fn with_issue(self, issue: Issue) -> Self {
        self.state.lock().unwrap().issues.insert(issue.number, issue);
        self
    }

    pub fn with_comment(self, number: u64, author: &str, body: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.comments.entry(number).or_default().push(IssueComment {
                id,
                body: body.to_string(),
                author: author.to_string(),
                html_url: format!("https://github.test/comment/{}", id),
                created_at: None,
                updated_at: None,
            });
        }
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .file_contents
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn comments_on(&self, number: u64) -> Vec<IssueComment> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: &str) -> Result<(), GitHubError> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.fail_with {
            Some(status) => Err(GitHubError::Api {
                status,
                message: "Resource not accessible by integration".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn not_found() -> GitHubError {
    GitHubError::Api {
        status: 404,
        message: "Not Found".to_string(),
    }
}

pub(crate) fn sample_pull_request(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: "Add widget cache".to_string(),
        body: Some("Speeds up widget lookups.".to_string()),
        state: "open".to_string(),
        author: "alice".to_string(),
        draft: false,
        merged: false,
        head_ref: "feature/cache".to_string(),
        head_sha: "abc123".to_string(),
        base_ref: "main".to_string(),
        base_sha: "def456".to_string(),
        additions: 12,
        deletions: 3,
        changed_files: 2,
        commits: 1,
        labels: Vec::new(),
        html_url: format!("https://github.test/octo/widgets/pull/{}", number),
    }
}

pub(crate) fn sample_file(name: &str, changes: u64) -> ChangedFile {
    ChangedFile {
        filename: name.to_string(),
        status: "modified".to_string(),
        additions: changes,
        deletions: 0,
        changes,
        patch: Some(format!("@@ -1 +1 @@\n+// {}", name)),
        previous_filename: None,
    }
}

pub(crate) fn sample_issue(number: u64) -> Issue {
    Issue {
        number,
        title: "Crash on startup".to_string(),
        body: Some("The app panics when the config file is empty.".to_string()),
        state: "open".to_string(),
        author: "bob".to_string(),
        labels: Vec::new(),
        assignees: Vec::new(),
        comments: 0,
        html_url: format!("https://github.test/octo/widgets/issues/{}", number),
        is_pull_request: false,
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn get_pull_request(&self, _repo: &RepoName, number: u64) -> Result<PullRequest, GitHubError> {
        self.record("get_pull_request")?;
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .get(&number)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list_pull_request_files(
        &self,
        _repo: &RepoName,
        number: u64,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        self.record("list_pull_request_files")?;
        self.state
            .lock()
            .unwrap()
            .files
            .get(&number)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_review(
        &self,
        _repo: &RepoName,
        number: u64,
        review: &ReviewRequest,
    ) -> Result<Review, GitHubError> {
        self.record("create_review")?;
        let mut state = self.state.lock().unwrap();
        state.reviews.push((number, review.clone()));
        state.next_id += 1;
        let state_name = match review.event {
            super::ReviewEvent::Approve => "APPROVED",
            super::ReviewEvent::RequestChanges => "CHANGES_REQUESTED",
            super::ReviewEvent::Comment => "COMMENTED",
        };
        Ok(Review {
            id: state.next_id,
            state: state_name.to_string(),
            submitted_at: None,
            html_url: None,
        })
    }

    async fn get_issue(&self, _repo: &RepoName, number: u64) -> Result<Issue, GitHubError> {
        self.record("get_issue")?;
        self.state
            .lock()
            .unwrap()
            .issues
            .get(&number)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list_issue_comments(
        &self,
        _repo: &RepoName,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        self.record("list_issue_comments")?;
        Ok(self.comments_on(number))
    }

    async fn create_issue_comment(
        &self,
        _repo: &RepoName,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError> {
        self.record("create_issue_comment")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let comment = IssueComment {
            id: state.next_id,
            body: body.to_string(),
            author: self
                .login
                .clone()
                .unwrap_or_else(|| "github-actions[bot]".to_string()),
            html_url: format!("https://github.test/comment/{}", state.next_id),
            created_at: None,
            updated_at: None,
        };
        state.comments.entry(number).or_default().push(comment.clone());
        Ok(comment)
    }

    async fn update_issue_comment(
        &self,
        _repo: &RepoName,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError> {
        self.record("update_issue_comment")?;
        let mut state = self.state.lock().unwrap();
        let comment = state
            .comments
            .values_mut()
            .flat_map(|c| c.iter_mut())
            .find(|c| c.id == comment_id)
            .ok_or_else(not_found)?;
        comment.body = body.to_string();
        Ok(comment.clone())
    }

    async fn add_labels(
        &self,
        _repo: &RepoName,
        number: u64,
        labels: &[String],
    ) -> Result<Vec<String>, GitHubError> {
        self.record("add_labels")?;
        let mut state = self.state.lock().unwrap();
        let issue = state.issues.get_mut(&number).ok_or_else(not_found)?;
        for label in labels {
            if !issue.labels.contains(label) {
                issue.labels.push(label.clone());
            }
        }
        Ok(issue.labels.clone())
    }

    async fn create_issue(&self, _repo: &RepoName, issue: &NewIssue) -> Result<Issue, GitHubError> {
        self.record("create_issue")?;
        let mut state = self.state.lock().unwrap();
        state.created_issues.push(issue.clone());
        state.next_id += 1;
        let number = 1000 + state.next_id;
        Ok(Issue {
            number,
            title: issue.title.clone(),
            body: Some(issue.body.clone()),
            state: "open".to_string(),
            author: self
                .login
                .clone()
                .unwrap_or_else(|| "github-actions[bot]".to_string()),
            labels: issue.labels.clone(),
            assignees: Vec::new(),
            comments: 0,
            html_url: format!("https://github.test/octo/widgets/issues/{}", number),
            is_pull_request: false,
        })
    }

    async fn get_repository(&self, repo: &RepoName) -> Result<Repository, GitHubError> {
        self.record("get_repository")?;
        Ok(Repository {
            name: repo.name.clone(),
            full_name: repo.to_string(),
            description: Some("Widgets as a service".to_string()),
            language: Some("Rust".to_string()),
            topics: vec!["widgets".to_string()],
            default_branch: "main".to_string(),
            license: Some("MIT License".to_string()),
            forks: 4,
            stars: 42,
            watchers: 42,
            open_issues: 7,
            subscribers: Some(3),
            size_kb: 512,
            created_at: None,
            updated_at: None,
            html_url: format!("https://github.test/{}", repo),
        })
    }

    async fn get_contents(
        &self,
        _repo: &RepoName,
        path: &str,
        _git_ref: Option<&str>,
    ) -> Result<Contents, GitHubError> {
        self.record("get_contents")?;
        let state = self.state.lock().unwrap();
        if let Some(content) = state.file_contents.get(path).cloned() {
            return Ok(Contents::File(FileContent {
                path: path.to_string(),
                size: content.len() as u64,
                sha: "0000".to_string(),
                content,
                html_url: None,
            }));
        }

        // Any path that prefixes stored files is a directory of its immediate children
        let prefix = if path.is_empty() { String::new() } else { format!("{}/", path) };
        let mut entries: Vec<ContentEntry> = Vec::new();
        for (file, content) in state.file_contents.iter().filter(|(p, _)| p.starts_with(&prefix)) {
            let rest = &file[prefix.len()..];
            let (name, kind, size) = match rest.split_once('/') {
                Some((dir, _)) => (dir, "dir", 0),
                None => (rest, "file", content.len() as u64),
            };
            if entries.iter().any(|e| e.name == name) {
                continue;
            }
            entries.push(ContentEntry {
                name: name.to_string(),
                path: format!("{}{}", prefix, name),
                kind: kind.to_string(),
                size,
                sha: "0000".to_string(),
                html_url: None,
            });
        }

        if entries.is_empty() {
            return Err(not_found());
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Contents::Directory { entries })
    }

    async fn search_code(&self, _repo: &RepoName, query: &str) -> Result<Vec<CodeSearchHit>, GitHubError> {
        self.record("search_code")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .file_contents
            .iter()
            .filter(|(_, content)| content.contains(query))
            .map(|(path, _)| CodeSearchHit {
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                path: path.clone(),
                sha: "0000".to_string(),
                html_url: None,
            })
            .collect())
    }

    async fn authenticated_login(&self) -> Result<Option<String>, GitHubError> {
        self.record("authenticated_login")?;
        Ok(self.login.clone())
    }
}
