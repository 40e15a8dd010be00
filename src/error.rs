use thiserror::Error;

use crate::config::ConfigError;
use crate::github::GitHubError;
use crate::llm::LlmError;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),
}

pub type Result<T> = std::result::Result<T, ActionError>;
