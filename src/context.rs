//! Event context loading.
//!
//! Turns the event payload into an [`EventContext`]: which repository the run
//! belongs to, who triggered it, and the subject the agent works on. For pull
//! request reviews the changed files are fetched from GitHub and narrowed by
//! the configured include/exclude globs.

use glob::Pattern;

use crate::agent::ActionType;
use crate::config::{Config, ConfigError, FileFilterConfig};
use crate::error::Result;
use crate::github::events::{self, EventPayload};
use crate::github::{ChangedFile, GitHubApi, RepoName};

/// Patches embedded in the initial prompt are cut at this length.
pub const MAX_PROMPT_PATCH_CHARS: usize = 4_000;

/// Immutable snapshot of the triggering event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub repository: RepoName,
    pub action: ActionType,
    /// `GITHUB_EVENT_NAME` (`pull_request`, `issues`, `schedule`, ...).
    pub event_name: Option<String>,
    /// Activity type from the payload (`opened`, `synchronize`, ...).
    pub event_action: Option<String>,
    pub actor: Option<String>,
    pub subject: Subject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    PullRequest(PullRequestSubject),
    Issue(IssueSubject),
    /// Whole-repository scan; no subject number.
    Repository,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSubject {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub head_ref: String,
    pub head_sha: String,
    pub base_ref: String,
    /// Changed files after filtering.
    pub files: Vec<ChangedFile>,
    /// Number of changed files before filtering.
    pub total_files: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueSubject {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
}

impl EventContext {
    pub fn subject_number(&self) -> Option<u64> {
        match &self.subject {
            Subject::PullRequest(pr) => Some(pr.number),
            Subject::Issue(issue) => Some(issue.number),
            Subject::Repository => None,
        }
    }
}

/// Read the payload named by the config and build the context.
pub async fn load_event_context(
    config: &Config,
    action: ActionType,
    github: &dyn GitHubApi,
) -> Result<EventContext> {
    let raw = events::read_payload(&config.event_path)?;
    let payload = events::parse_payload(&raw)?;
    tracing::debug!(
        repository = %payload.repository,
        event = ?config.event_name,
        "Event payload parsed"
    );

    let subject = match action {
        ActionType::PrReview => {
            let pr = payload.pull_request.clone().ok_or_else(|| {
                ConfigError::MalformedEvent(
                    "pr-review requires a pull_request event (missing pull_request.number)".to_string(),
                )
            })?;

            let filter = FileFilter::new(&config.files)?;
            let changed = github.list_pull_request_files(&payload.repository, pr.number).await?;
            let total_files = changed.len();
            let files = filter.apply(changed);
            tracing::info!(
                pr = pr.number,
                total = total_files,
                selected = files.len(),
                "Loaded pull request files"
            );

            Subject::PullRequest(PullRequestSubject {
                number: pr.number,
                title: pr.title,
                body: pr.body,
                head_ref: pr.head_ref,
                head_sha: pr.head_sha,
                base_ref: pr.base_ref,
                files,
                total_files,
            })
        }
        ActionType::IssueAnalyze => {
            let issue = payload.issue.clone().ok_or_else(|| {
                ConfigError::MalformedEvent(
                    "issue-analyze requires an issues event (missing issue.number)".to_string(),
                )
            })?;
            if issue.is_pull_request {
                return Err(ConfigError::MalformedEvent(format!(
                    "issue-analyze requires an issues event, but #{} is a pull request",
                    issue.number
                ))
                .into());
            }
            Subject::Issue(IssueSubject {
                number: issue.number,
                title: issue.title,
                body: issue.body,
                labels: issue.labels,
            })
        }
        ActionType::CodeScan => Subject::Repository,
    };

    Ok(build_context(payload, action, config, subject))
}

fn build_context(payload: EventPayload, action: ActionType, config: &Config, subject: Subject) -> EventContext {
    EventContext {
        repository: payload.repository,
        action,
        event_name: config.event_name.clone(),
        event_action: payload.action,
        actor: payload.sender.or_else(|| config.actor.clone()),
        subject,
    }
}

/// Compiled include/exclude globs plus the file budget.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    max_files: usize,
}

impl FileFilter {
    pub fn new(config: &FileFilterConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            include: compile_patterns("include-patterns", &config.include_patterns)?,
            exclude: compile_patterns("exclude-patterns", &config.exclude_patterns)?,
            max_files: config.max_files,
        })
    }

    /// Apply exclude globs, then include globs, then the file budget.
    ///
    /// With no patterns the first `max_files` files are kept in API order.
    /// Otherwise the survivors are ordered by number of changes, largest first.
    pub fn apply(&self, files: Vec<ChangedFile>) -> Vec<ChangedFile> {
        if self.include.is_empty() && self.exclude.is_empty() {
            if files.len() > self.max_files {
                tracing::warn!(
                    total = files.len(),
                    max_files = self.max_files,
                    "Too many changed files, reviewing only the first ones"
                );
            }
            return files.into_iter().take(self.max_files).collect();
        }

        let mut selected: Vec<ChangedFile> = files
            .into_iter()
            .filter(|f| !self.exclude.iter().any(|p| p.matches(&f.filename)))
            .filter(|f| self.include.is_empty() || self.include.iter().any(|p| p.matches(&f.filename)))
            .collect();

        selected.sort_by(|a, b| b.changes.cmp(&a.changes));
        if selected.len() > self.max_files {
            tracing::warn!(
                matched = selected.len(),
                max_files = self.max_files,
                "Too many matching files, reviewing the largest changes only"
            );
            selected.truncate(self.max_files);
        }
        selected
    }
}

fn compile_patterns(input: &str, patterns: &[String]) -> std::result::Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| ConfigError::InvalidValue(input.to_string(), format!("{}: {}", p, e)))
        })
        .collect()
}
