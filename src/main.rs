//! GitHub Agent Action - Entry Point
//!
//! Reads the action inputs, runs the agent once and maps the result to an
//! exit status.

use std::process::ExitCode;

use anyhow::Context;
use github_agent_action::config::{self, Config};
use github_agent_action::{action, agent::RunStatus};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // LOG_LEVEL picks the default filter; RUST_LOG overrides it
    let level = config::log_level_from_env();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match try_main().await {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(RunStatus::TurnLimitExceeded) => {
            warn!("Agent did not produce a final answer within the turn limit");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> anyhow::Result<RunStatus> {
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        action = %config.action_type,
        model = config.model_or_default(),
        max_turns = config.max_turns,
        "Loaded configuration"
    );

    let outcome = action::run(&config).await.context("Action failed")?;
    Ok(outcome.status)
}

fn default_filter(level: &str) -> EnvFilter {
    let directive = match level.trim().to_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    EnvFilter::new(format!("github_agent_action={},warn", directive))
}
