//! System prompt templates and initial messages for each action.

use crate::context::{EventContext, Subject, MAX_PROMPT_PATCH_CHARS};
use crate::tools::{truncate_text, ToolKind};

use super::ActionType;

const BASELINE: &str = r#"## Rules

1. **Use tools to act** - Use tools to perform actions rather than describing them. A review, comment or label only exists once the tool call succeeds.

2. **Read before judging** - Fetch the files and context you need instead of guessing.

3. **Respond concisely** - Keep comments and the final answer short and specific. Reference files and lines.

4. **Handle tool errors** - If a tool returns an error, adjust the arguments or continue without it. Do not repeat a failing call unchanged.

5. **Finish with the report** - Once all actions are done, reply without tool calls. That final message is the structured report for this run."#;

const PR_REVIEW: &str = r#"You are a code-review agent analyzing a GitHub pull request.

Your objectives:
- Identify the key changes, assess their quality, detect bugs and suggest improvements.
- Deliver a summary of changes, a quality assessment, potential issues, actionable suggestions and an overall recommendation (APPROVE, REQUEST_CHANGES or COMMENT).

Workflow:
1. Review the diff included in the request. Use get_pull_request_files if files were left out.
2. Use get_repository_file_content, list_repository_files and search_code for surrounding context.
3. Submit a review with create_pull_request_review, attaching inline comments to specific lines.
4. Post your summary with update_or_create_pr_comment so reruns update the same comment."#;

const PR_APPROVAL: &str = "If the changes are correct and ready to merge, approve them with approve_pull_request instead of submitting a COMMENT review.";

const ISSUE_ANALYZE: &str = r#"You are an issue analyzer that categorizes and assesses GitHub issues.

Investigate the issue with the tools provided and produce:
1. A summary of the issue
2. The category (bug, feature request, question, documentation, ...) with a confidence level
3. Estimated complexity (low, medium, high)
4. Suggested priority (low, medium, high)
5. Code areas that are likely related
6. Suggested next steps

Look at the repository code to find the root cause or a possible solution.

When done, post your analysis with update_or_create_issue_comment and apply fitting labels with add_labels_to_issue."#;

const CODE_SCAN: &str = r#"You are a code scan agent that analyzes the code of a GitHub repository.

Scan the repository and report:
1. An overview of the scan
2. Issues found, each with file, line if possible, severity, description and suggestion
3. Good practices observed
4. Recommendations for improvement

Look for security vulnerabilities, performance problems, likely bugs and anti-patterns. Focus on the most important issues first.

If you find significant issues, open an issue in the repository with create_issue summarizing them."#;

/// Build the system prompt for an action; a custom prompt is appended, never substituted.
pub fn build_system_prompt(action: ActionType, tools: &[ToolKind], custom_prompt: Option<&str>) -> String {
    let role = match action {
        ActionType::PrReview if tools.contains(&ToolKind::ApprovePullRequest) => {
            format!("{}\n\n{}", PR_REVIEW, PR_APPROVAL)
        }
        ActionType::PrReview => PR_REVIEW.to_string(),
        ActionType::IssueAnalyze => ISSUE_ANALYZE.to_string(),
        ActionType::CodeScan => CODE_SCAN.to_string(),
    };

    let tool_descriptions = tools
        .iter()
        .map(|t| format!("- **{}**: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "{role}\n\n## Tools\n\n{tool_descriptions}\n\n{baseline}",
        role = role,
        tool_descriptions = tool_descriptions,
        baseline = BASELINE
    );

    if let Some(custom) = custom_prompt.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\n## Additional Instructions\n\n");
        prompt.push_str(custom);
    }

    prompt
}

/// First user message of the conversation, built from the event.
pub fn build_initial_message(ctx: &EventContext) -> String {
    let repo = &ctx.repository;
    match &ctx.subject {
        Subject::PullRequest(pr) => {
            let mut msg = format!(
                "Please review pull request {}#{}: {}\n\nBranch: {} -> {} (head {})\n",
                repo, pr.number, pr.title, pr.head_ref, pr.base_ref, pr.head_sha
            );
            if let Some(actor) = &ctx.actor {
                msg.push_str(&format!("Triggered by: {}\n", actor));
            }
            if let Some(body) = pr.body.as_deref().filter(|b| !b.trim().is_empty()) {
                msg.push_str(&format!("\n### Description\n\n{}\n", body.trim()));
            }

            msg.push_str(&format!(
                "\n### Changed files ({} of {})\n",
                pr.files.len(),
                pr.total_files
            ));
            for file in &pr.files {
                msg.push_str(&format!(
                    "\n#### {} ({}, +{} -{})\n",
                    file.filename, file.status, file.additions, file.deletions
                ));
                match &file.patch {
                    Some(patch) => {
                        msg.push_str("```diff\n");
                        msg.push_str(&truncate_text(patch, MAX_PROMPT_PATCH_CHARS));
                        msg.push_str("\n```\n");
                    }
                    None => msg.push_str("(no textual diff)\n"),
                }
            }
            msg
        }
        Subject::Issue(issue) => {
            let mut msg = format!(
                "Please analyze this GitHub issue:\n\nRepository: {}\nIssue #{}: {}\n",
                repo, issue.number, issue.title
            );
            if !issue.labels.is_empty() {
                msg.push_str(&format!("Labels: {}\n", issue.labels.join(", ")));
            }
            if let Some(body) = issue.body.as_deref().filter(|b| !b.trim().is_empty()) {
                msg.push_str(&format!("\n{}\n", body.trim()));
            }
            msg
        }
        Subject::Repository => format!(
            "Please perform a security and best practices scan on this repository:\n\nRepository: {}\n\n\
             Explore the repository with the tools provided and scan for security vulnerabilities, \
             code quality issues and deviations from best practices.",
            repo
        ),
    }
}
