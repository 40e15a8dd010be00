//! Conversation transcript kept for logging.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single entry in the conversation transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Utc>,

    /// Turn the entry belongs to (1-based).
    pub turn: usize,

    pub entry_type: EntryType,

    pub content: String,

    /// Tool name for tool entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

/// Types of transcript entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Text the model sent alongside tool calls
    ModelMessage,
    /// Tool is being called
    ToolCall,
    /// Tool returned a result
    ToolResult,
    /// Tool returned an error
    ToolError,
    /// Model produced its final answer
    FinalAnswer,
}

/// Append-only list of entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, turn: usize, entry_type: EntryType, content: impl Into<String>, tool: Option<&str>) {
        self.entries.push(TranscriptEntry {
            timestamp: Utc::now(),
            turn,
            entry_type,
            content: content.into(),
            tool: tool.map(String::from),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn count(&self, entry_type: EntryType) -> usize {
        self.entries.iter().filter(|e| e.entry_type == entry_type).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
