use serde::Serialize;

use crate::engine::ErrorKind;
use crate::engine::command::Command;
use crate::engine::lifecycle::StateDelta;

/// Outcome of one command, ready for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub valid: bool,
    pub error_kind: Option<ErrorKind>,
    /// Status line on success; problem and fix on failure.
    pub message: String,
    /// The same outcome told in harbor terms.
    pub metaphor: String,
    pub suggestions: Vec<String>,
    pub state_delta: Option<StateDelta>,
    /// What the Docker CLI itself would have printed; may be empty.
    pub output: String,
    pub help_hint: Option<String>,
    pub command: Option<Command>,
}

impl ParseResult {
    pub fn is_rejected(&self) -> bool {
        !self.valid
    }
}

/// Result of running one command through the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub result: ParseResult,
    /// The snapshot changed and should be persisted.
    pub dirty: bool,
    /// Whether the command satisfied the active tutorial step; `None` when
    /// no step was given.
    pub tutorial: Option<bool>,
}
