//! Configuration management for the action.
//!
//! Every input is read from its upper-snake environment variable first
//! (`ACTION_TYPE`, `MAX_TURNS`, ...) and then from the form GitHub Actions
//! uses for declared inputs (`INPUT_ACTION-TYPE`). Empty values count as unset.
//!
//! - `ACTION_TYPE` - Required. One of `pr-review`, `issue-analyze`, `code-scan`.
//! - `OPENAI_API_KEY` - Required. API key for the LLM provider.
//! - `GITHUB_TOKEN` - Required. Token used for all GitHub API calls.
//! - `MODEL` - Optional. Defaults to `gpt-4o-mini`.
//! - `CUSTOM_PROMPT` - Optional. Appended to the default system prompt.
//! - `MAX_TURNS` - Optional. Turn budget for the conversation. Defaults to `30`.
//! - `MAX_FILES` - Optional. Changed files embedded in a PR review. Defaults to `10`.
//! - `INCLUDE_PATTERNS` / `EXCLUDE_PATTERNS` - Optional. Comma-separated globs.
//! - `AUTO_APPROVE` - Optional. Offers the approval tool to the PR reviewer.
//! - `OPENAI_BASE_URL` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `GITHUB_API_URL` - Optional. Defaults to `https://api.github.com`.
//! - `GITHUB_EVENT_PATH` - Required. Path to the event payload JSON.
//! - `GITHUB_EVENT_NAME` / `GITHUB_ACTOR` - Optional, set by the runner.
//! - `LOG_LEVEL` - Optional. Defaults to `info`. Read by [`log_level_from_env`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TURNS: usize = 30;
pub const DEFAULT_MAX_FILES: usize = 10;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Unknown action type: {0} (expected pr-review, issue-analyze or code-scan)")]
    UnknownActionType(String),

    #[error("Failed to read event payload {path}: {source}")]
    EventRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),
}

/// Action configuration, resolved once at startup.
#[derive(Clone)]
pub struct Config {
    /// Raw action type; validated by the agent configurator
    pub action_type: String,

    /// LLM provider API key
    pub openai_api_key: String,

    /// GitHub token
    pub github_token: String,

    /// Model override
    pub model: Option<String>,

    /// Extra instructions appended to the default system prompt
    pub custom_prompt: Option<String>,

    /// Maximum model invocations per run
    pub max_turns: usize,

    /// Changed-file selection for PR reviews
    pub files: FileFilterConfig,

    /// Whether the PR reviewer may approve
    pub auto_approve: bool,

    /// Chat completions base URL
    pub openai_base_url: String,

    /// GitHub REST base URL
    pub github_api_url: String,

    /// Path to the event payload
    pub event_path: PathBuf,

    /// Name of the triggering event (e.g. `pull_request`)
    pub event_name: Option<String>,

    /// User that triggered the workflow
    pub actor: Option<String>,
}

/// Which changed files end up in a PR review prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilterConfig {
    pub max_files: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for FileFilterConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("action_type", &self.action_type)
            .field("openai_api_key", &"<redacted>")
            .field("github_token", &"<redacted>")
            .field("model", &self.model)
            .field("custom_prompt", &self.custom_prompt.as_ref().map(|p| p.len()))
            .field("max_turns", &self.max_turns)
            .field("files", &self.files)
            .field("auto_approve", &self.auto_approve)
            .field("openai_base_url", &self.openai_base_url)
            .field("github_api_url", &self.github_api_url)
            .field("event_path", &self.event_path)
            .field("event_name", &self.event_name)
            .field("actor", &self.actor)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingInput` if `ACTION_TYPE`, `OPENAI_API_KEY`
    /// or `GITHUB_TOKEN` is not set, and `ConfigError::MissingEnvVar` if
    /// `GITHUB_EVENT_PATH` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let inputs = Inputs { lookup: &lookup };

        let action_type = inputs.required("action-type")?;
        let openai_api_key = inputs.required("openai-api-key")?;
        let github_token = inputs.required("github-token")?;

        let max_turns = inputs.parse_or("max-turns", DEFAULT_MAX_TURNS)?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "max-turns".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let files = FileFilterConfig {
            max_files: inputs.parse_or("max-files", DEFAULT_MAX_FILES)?,
            include_patterns: inputs
                .optional("include-patterns")
                .map(|v| parse_patterns(&v))
                .unwrap_or_default(),
            exclude_patterns: inputs
                .optional("exclude-patterns")
                .map(|v| parse_patterns(&v))
                .unwrap_or_default(),
        };

        let auto_approve = inputs
            .optional("auto-approve")
            .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue("auto-approve".to_string(), e)))
            .transpose()?
            .unwrap_or(false);

        let event_path = env_value(&lookup, "GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("GITHUB_EVENT_PATH".to_string()))?;

        Ok(Self {
            action_type,
            openai_api_key,
            github_token,
            model: inputs.optional("model"),
            custom_prompt: inputs.optional("custom-prompt"),
            max_turns,
            files,
            auto_approve,
            openai_base_url: inputs
                .optional("openai-base-url")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            github_api_url: env_value(&lookup, "GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            event_path,
            event_name: env_value(&lookup, "GITHUB_EVENT_NAME"),
            actor: env_value(&lookup, "GITHUB_ACTOR"),
        })
    }

    /// Model to use, falling back to the default.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Read the `log-level` input from the environment.
///
/// Resolved on its own so logging can start before the rest of the
/// configuration is validated.
pub fn log_level_from_env() -> String {
    log_level_from_lookup(|key| std::env::var(key).ok())
}

pub fn log_level_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    Inputs { lookup: &lookup }
        .optional("log-level")
        .unwrap_or_else(|| "info".to_string())
}

/// Resolves action inputs in both the plain and the `INPUT_` form.
struct Inputs<'a, F> {
    lookup: &'a F,
}

impl<F> Inputs<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        let upper = name.to_uppercase();
        [
            upper.replace('-', "_"),
            format!("INPUT_{}", upper),
            format!("INPUT_{}", upper.replace('-', "_")),
        ]
        .iter()
        .find_map(|key| env_value(self.lookup, key))
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::MissingInput(name.to_string()))
    }

    fn parse_or<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
            None => Ok(default),
        }
    }
}

fn env_value<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated glob list, dropping blanks.
pub fn parse_patterns(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ACTION_TYPE", "pr-review"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GITHUB_TOKEN", "ghs_test"),
            ("GITHUB_EVENT_PATH", "/github/workflow/event.json"),
        ]
    }

    #[test]
    fn defaults_apply_when_optional_inputs_missing() {
        let config = Config::from_lookup(lookup_from(&base_vars())).unwrap();

        assert_eq!(config.action_type, "pr-review");
        assert_eq!(config.model_or_default(), "gpt-4o-mini");
        assert_eq!(config.max_turns, 30);
        assert_eq!(config.files, FileFilterConfig::default());
        assert!(!config.auto_approve);
        assert_eq!(config.custom_prompt, None);
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.github_api_url, DEFAULT_GITHUB_API_URL);
    }

    #[test]
    fn log_level_uses_input_lookup() {
        assert_eq!(log_level_from_lookup(lookup_from(&[])), "info");
        assert_eq!(log_level_from_lookup(lookup_from(&[("LOG_LEVEL", "debug")])), "debug");
        assert_eq!(
            log_level_from_lookup(lookup_from(&[("INPUT_LOG-LEVEL", "warn")])),
            "warn"
        );
        assert_eq!(
            log_level_from_lookup(lookup_from(&[("LOG_LEVEL", " "), ("INPUT_LOG_LEVEL", "trace")])),
            "trace"
        );
    }

    #[test]
    fn action_inputs_are_read_from_input_prefix() {
        let config = Config::from_lookup(lookup_from(&[
            ("INPUT_ACTION-TYPE", "code-scan"),
            ("INPUT_OPENAI-API-KEY", "sk-test"),
            ("INPUT_GITHUB-TOKEN", "ghs_test"),
            ("INPUT_MAX-TURNS", "5"),
            ("INPUT_CUSTOM-PROMPT", "Focus on SQL injection."),
            ("GITHUB_EVENT_PATH", "/tmp/event.json"),
        ]))
        .unwrap();

        assert_eq!(config.action_type, "code-scan");
        assert_eq!(config.max_turns, 5);
        assert_eq!(config.custom_prompt.as_deref(), Some("Focus on SQL injection."));
    }

    #[test]
    fn empty_values_are_treated_as_unset() {
        let mut vars = base_vars();
        vars.push(("MODEL", ""));
        vars.push(("INPUT_MODEL", "gpt-4o"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("ACTION_TYPE", "pr-review"),
            ("GITHUB_TOKEN", "ghs_test"),
            ("GITHUB_EVENT_PATH", "/tmp/event.json"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput(ref name) if name == "openai-api-key"));
    }

    #[test]
    fn missing_event_path_is_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("ACTION_TYPE", "pr-review"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GITHUB_TOKEN", "ghs_test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "GITHUB_EVENT_PATH"));
    }

    #[test]
    fn invalid_max_turns_is_rejected() {
        let mut vars = base_vars();
        vars.push(("MAX_TURNS", "lots"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&vars)),
            Err(ConfigError::InvalidValue(..))
        ));

        let mut vars = base_vars();
        vars.push(("MAX_TURNS", "0"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&vars)),
            Err(ConfigError::InvalidValue(..))
        ));
    }

    #[test]
    fn file_filters_and_auto_approve_parse() {
        let mut vars = base_vars();
        vars.push(("INCLUDE_PATTERNS", "src/**/*.rs, *.toml ,"));
        vars.push(("EXCLUDE_PATTERNS", "vendor/*"));
        vars.push(("MAX_FILES", "3"));
        vars.push(("AUTO_APPROVE", "yes"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.files.include_patterns, vec!["src/**/*.rs", "*.toml"]);
        assert_eq!(config.files.exclude_patterns, vec!["vendor/*"]);
        assert_eq!(config.files.max_files, 3);
        assert!(config.auto_approve);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&base_vars())).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-test"));
        assert!(!rendered.contains("ghs_test"));
    }
}
