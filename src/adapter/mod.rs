pub mod json_adapter;
pub mod text_adapter;

use chrono::Utc;

use crate::engine::{Execution, ExpectedCommand, RawCommand, Simulator};
use crate::state::StateSnapshot;

/// A command as received from the command line or stdin, before any
/// validation. JSON input keeps its original value and undecodable stdin
/// lines keep their bytes so that the normalizer rejects them with a typed
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandInput {
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl CommandInput {
    pub fn as_raw(&self) -> RawCommand<'_> {
        match self {
            Self::Text(text) => RawCommand::Text(text),
            Self::Bytes(bytes) => RawCommand::Bytes(bytes),
            Self::Json(value) => RawCommand::Json(value),
        }
    }
}

/// Abstracts output-format differences between the text and JSON
/// presentations.
pub trait Endpoint {
    /// Commands to run, in order.
    fn extract_commands(&self) -> Result<Vec<CommandInput>, anyhow::Error>;

    /// Render one execution.
    fn handle_execution(&self, execution: &Execution) -> Result<(), anyhow::Error>;

    /// Handle an error with format-specific error reporting. Returns the exit code.
    fn handle_error(&self, error: anyhow::Error) -> i32;
}

/// The tutorial step a run is working on.
#[derive(Debug, Clone, Copy)]
pub struct TutorialGoal<'a> {
    pub step_id: &'a str,
    pub expected: &'a ExpectedCommand,
}

/// What the commands run against.
pub enum Session<'a> {
    /// Parse and validate only; no state is read or written.
    CheckOnly,
    /// Commands change the snapshot. With a goal, every command counts as an
    /// attempt at that step in the snapshot's tutorial progress.
    Stateful {
        snapshot: &'a mut StateSnapshot,
        goal: Option<TutorialGoal<'a>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 0 when every command was valid, 1 when any was rejected, 2 on an
    /// endpoint error.
    pub exit_code: i32,
    /// The snapshot or its tutorial progress changed and should be saved.
    pub dirty: bool,
}

/// Run the common flow for any endpoint.
///
/// 1. Extract the commands from the endpoint's input
/// 2. Execute each one in order against the session
/// 3. Hand every execution to the endpoint for rendering
pub fn run(endpoint: &dyn Endpoint, simulator: &Simulator, mut session: Session<'_>) -> RunSummary {
    let commands = match endpoint.extract_commands() {
        Ok(commands) => commands,
        Err(e) => {
            return RunSummary {
                exit_code: endpoint.handle_error(e),
                dirty: false,
            };
        }
    };

    let mut summary = RunSummary {
        exit_code: 0,
        dirty: false,
    };

    for input in &commands {
        let execution = match &mut session {
            Session::CheckOnly => Execution {
                result: simulator.check(input.as_raw()),
                dirty: false,
                tutorial: None,
            },
            Session::Stateful { snapshot, goal } => {
                let execution =
                    simulator.execute(input.as_raw(), snapshot, goal.map(|g| g.expected));
                if let (Some(goal), Some(completed)) = (*goal, execution.tutorial) {
                    if snapshot
                        .progress_mut()
                        .record_attempt(goal.step_id, completed, Utc::now())
                    {
                        tracing::info!(step = goal.step_id, "tutorial step completed");
                    }
                    summary.dirty = true;
                }
                execution
            }
        };

        summary.dirty |= execution.dirty;
        if execution.result.is_rejected() {
            summary.exit_code = summary.exit_code.max(1);
        }

        if let Err(e) = endpoint.handle_execution(&execution) {
            summary.exit_code = endpoint.handle_error(e);
            return summary;
        }
    }

    summary
}
