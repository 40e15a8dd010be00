//! Structured reports the agent returns as its final answer.
//!
//! Each action type has a fixed report shape. The shape is sent to the model
//! as a strict JSON schema and the final message is decoded back into the
//! matching struct.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::github::ReviewEvent;
use crate::llm::ResponseFormat;

use super::configurator::ActionType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrReviewReport {
    pub summary: String,
    pub code_quality: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub assessment: String,
    pub review_event: ReviewEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueCategory {
    pub name: String,
    /// 0.0 to 1.0.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueAnalysisReport {
    pub summary: String,
    pub category: IssueCategory,
    pub complexity: String,
    pub priority: String,
    pub related_areas: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeIssue {
    pub file: String,
    #[serde(default)]
    pub line: Option<u64>,
    pub severity: String,
    pub description: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeScanReport {
    pub overview: String,
    pub issues: Vec<CodeIssue>,
    pub good_practices: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Decoded final answer, one variant per action type.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AgentReport {
    PrReview(PrReviewReport),
    IssueAnalysis(IssueAnalysisReport),
    CodeScan(CodeScanReport),
}

impl AgentReport {
    /// Decode `text` as the report for `action`.
    ///
    /// A surrounding Markdown code fence is tolerated.
    pub fn parse(action: ActionType, text: &str) -> Result<Self, serde_json::Error> {
        let body = strip_code_fence(text);
        Ok(match action {
            ActionType::PrReview => AgentReport::PrReview(serde_json::from_str(body)?),
            ActionType::IssueAnalyze => AgentReport::IssueAnalysis(serde_json::from_str(body)?),
            ActionType::CodeScan => AgentReport::CodeScan(serde_json::from_str(body)?),
        })
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (```json)
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Response format constraining the final answer for `action`.
pub fn response_format(action: ActionType) -> ResponseFormat {
    match action {
        ActionType::PrReview => ResponseFormat::json_schema("pr_review_report", pr_review_schema()),
        ActionType::IssueAnalyze => {
            ResponseFormat::json_schema("issue_analysis_report", issue_analysis_schema())
        }
        ActionType::CodeScan => ResponseFormat::json_schema("code_scan_report", code_scan_schema()),
    }
}

/// Strict object schema: every property is required, nothing else allowed.
fn object(properties: Value) -> Value {
    let required: Vec<String> = properties
        .as_object()
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn string_list(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": description})
}

fn pr_review_schema() -> Value {
    object(json!({
        "summary": {"type": "string", "description": "Summary of the changes in the pull request"},
        "code_quality": {"type": "string", "description": "Assessment of code quality"},
        "issues": string_list("Potential issues or bugs found"),
        "suggestions": string_list("Suggestions for improvement"),
        "assessment": {"type": "string", "description": "Overall assessment"},
        "review_event": {
            "type": "string",
            "enum": ["APPROVE", "REQUEST_CHANGES", "COMMENT"],
            "description": "Review verdict submitted for the pull request"
        }
    }))
}

fn issue_analysis_schema() -> Value {
    object(json!({
        "summary": {"type": "string", "description": "Summary of the issue"},
        "category": object(json!({
            "name": {"type": "string", "description": "Category such as bug, feature request or question"},
            "confidence": {"type": "number", "description": "Confidence score between 0 and 1"}
        })),
        "complexity": {"type": "string", "enum": ["low", "medium", "high"]},
        "priority": {"type": "string", "enum": ["low", "medium", "high"]},
        "related_areas": string_list("Code areas related to the issue"),
        "next_steps": string_list("Suggested next steps to resolve the issue")
    }))
}

fn code_scan_schema() -> Value {
    let issue = object(json!({
        "file": {"type": "string", "description": "File path where the issue was found"},
        "line": {"type": ["integer", "null"], "description": "Line number, if known"},
        "severity": {"type": "string", "enum": ["critical", "high", "medium", "low"]},
        "description": {"type": "string", "description": "What is wrong"},
        "suggestion": {"type": "string", "description": "How to fix it"}
    }));
    object(json!({
        "overview": {"type": "string", "description": "Overview of the scan results"},
        "issues": {"type": "array", "items": issue},
        "good_practices": string_list("Good practices observed in the code"),
        "recommendations": string_list("Overall recommendations")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [ActionType; 3] = [
        ActionType::PrReview,
        ActionType::IssueAnalyze,
        ActionType::CodeScan,
    ];

    /// Strict mode needs every object closed and fully required.
    fn assert_strict(schema: &Value, at: &str) {
        if schema["type"] == "object" {
            assert_eq!(schema["additionalProperties"], false, "{at} is open");
            let props = schema["properties"].as_object().unwrap();
            let required: Vec<&str> = schema["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            for (name, prop) in props {
                assert!(required.contains(&name.as_str()), "{at}.{name} not required");
                assert_strict(prop, &format!("{at}.{name}"));
            }
        }
        if let Some(items) = schema.get("items") {
            assert_strict(items, &format!("{at}[]"));
        }
    }

    #[test]
    fn every_schema_is_strict() {
        for action in ALL_ACTIONS {
            let format = response_format(action);
            assert_eq!(format.kind, "json_schema");
            assert!(format.json_schema.strict);
            assert_strict(&format.json_schema.schema, format.name());
        }
    }

    #[test]
    fn schema_names_follow_action() {
        assert_eq!(response_format(ActionType::PrReview).name(), "pr_review_report");
        assert_eq!(response_format(ActionType::IssueAnalyze).name(), "issue_analysis_report");
        assert_eq!(response_format(ActionType::CodeScan).name(), "code_scan_report");
    }

    #[test]
    fn parses_pr_review_report() {
        let text = r#"{
            "summary": "Adds a widget cache",
            "code_quality": "Clean",
            "issues": ["Cache is never invalidated"],
            "suggestions": ["Add a TTL"],
            "assessment": "Needs a small fix",
            "review_event": "REQUEST_CHANGES"
        }"#;

        match AgentReport::parse(ActionType::PrReview, text).unwrap() {
            AgentReport::PrReview(report) => {
                assert_eq!(report.review_event, ReviewEvent::RequestChanges);
                assert_eq!(report.issues, vec!["Cache is never invalidated"]);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn parses_fenced_issue_analysis_report() {
        let text = "```json\n{\"summary\": \"Crash on startup\", \"category\": {\"name\": \"bug\", \"confidence\": 0.9}, \"complexity\": \"low\", \"priority\": \"high\", \"related_areas\": [\"src/main.rs\"], \"next_steps\": [\"Reproduce\"]}\n```";

        match AgentReport::parse(ActionType::IssueAnalyze, text).unwrap() {
            AgentReport::IssueAnalysis(report) => {
                assert_eq!(report.category.name, "bug");
                assert!((report.category.confidence - 0.9).abs() < f64::EPSILON);
                assert_eq!(report.priority, "high");
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn parses_code_scan_report_with_unknown_line() {
        let text = r#"{
            "overview": "Two findings",
            "issues": [
                {"file": "src/db.rs", "line": 42, "severity": "critical", "description": "SQL built by string concatenation", "suggestion": "Use bound parameters"},
                {"file": "Cargo.toml", "line": null, "severity": "low", "description": "Unpinned git dependency", "suggestion": "Pin a revision"}
            ],
            "good_practices": ["Errors are typed"],
            "recommendations": ["Add fuzzing"]
        }"#;

        match AgentReport::parse(ActionType::CodeScan, text).unwrap() {
            AgentReport::CodeScan(report) => {
                assert_eq!(report.issues.len(), 2);
                assert_eq!(report.issues[0].line, Some(42));
                assert_eq!(report.issues[1].line, None);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn plain_text_is_not_a_report() {
        assert!(AgentReport::parse(ActionType::CodeScan, "No issues found.").is_err());
        assert!(AgentReport::parse(ActionType::PrReview, "```\n```").is_err());
    }
}
