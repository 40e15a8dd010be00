//! Runs one action end to end.

use std::sync::Arc;

use uuid::Uuid;

use crate::agent::{build_initial_message, AgentConfig, ConversationRunner, RunOutcome, RunStatus};
use crate::config::Config;
use crate::context::load_event_context;
use crate::error::Result;
use crate::github::{GitHubApi, GitHubClient};
use crate::llm::{LlmClient, OpenAiClient};
use crate::tools::ToolRegistry;

/// Resolve the agent, build the clients and run the conversation.
pub async fn run(config: &Config) -> Result<RunOutcome> {
    let agent = AgentConfig::from_config(config)?;

    let github = Arc::new(GitHubClient::new(
        config.github_token.clone(),
        config.github_api_url.clone(),
    )?);
    let llm = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )?);

    run_with(config, agent, github, llm).await
}

/// Run with explicit clients.
pub async fn run_with(
    config: &Config,
    agent: AgentConfig,
    github: Arc<dyn GitHubApi>,
    llm: Arc<dyn LlmClient>,
) -> Result<RunOutcome> {
    let run_id = Uuid::new_v4();
    tracing::info!(
        %run_id,
        action = %agent.action,
        model = %agent.model,
        max_turns = agent.max_turns,
        "Starting action"
    );

    let ctx = load_event_context(config, agent.action, github.as_ref()).await?;
    tracing::info!(
        %run_id,
        repository = %ctx.repository,
        subject = ?ctx.subject_number(),
        actor = ?ctx.actor,
        "Event context loaded"
    );

    let input = build_initial_message(&ctx);
    let tools = ToolRegistry::new(github, ctx.repository.clone(), &agent.tools);
    let runner = ConversationRunner::new(llm, tools, agent);

    let outcome = runner.run(&input).await?;
    match outcome.status {
        RunStatus::Completed => tracing::info!(%run_id, turns = outcome.turns, "Agent finished"),
        RunStatus::TurnLimitExceeded => tracing::warn!(
            %run_id,
            turns = outcome.turns,
            "Agent stopped at the turn limit"
        ),
    }
    match (&outcome.report, &outcome.final_output) {
        (Some(report), _) => match serde_json::to_string_pretty(report) {
            Ok(json) => tracing::info!(%run_id, "Report:\n{}", json),
            Err(e) => tracing::warn!(%run_id, error = %e, "Could not render report"),
        },
        (None, Some(output)) => tracing::info!(%run_id, "Final output:\n{}", output),
        (None, None) => {}
    }

    Ok(outcome)
}
