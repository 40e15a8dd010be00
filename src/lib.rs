//! # GitHub Agent Action
//!
//! A GitHub Action that puts an LLM agent to work on the event that triggered
//! the workflow: reviewing pull requests, analyzing issues or scanning the
//! repository.
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Read the configuration and the event payload
//! 2. Pick the system prompt and tool subset for the action type
//! 3. Call the LLM, execute any tool calls against GitHub
//! 4. Feed results back to the LLM, repeat until done or out of turns
//!
//! ## Example
//!
//! ```rust,ignore
//! use github_agent_action::{action, config::Config};
//!
//! let config = Config::from_env()?;
//! let outcome = action::run(&config).await?;
//! println!("{:?}", outcome.final_output);
//! ```

pub mod action;
pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod github;
pub mod llm;
pub mod tools;

pub use config::Config;
pub use error::ActionError;
