use serde::Serialize;

use crate::engine::{Execution, ParseResult};

use super::{CommandInput, Endpoint};

/// One line of JSON written to stdout per command.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JsonOutput<'a> {
    #[serde(flatten)]
    pub result: &'a ParseResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutorial_completed: Option<bool>,
}

/// Machine-readable endpoint; every result is printed as a single JSON object.
pub struct JsonAdapter {
    commands: Vec<CommandInput>,
}

impl JsonAdapter {
    pub fn new(commands: Vec<CommandInput>) -> Self {
        Self { commands }
    }
}

pub fn build_json_output(execution: &Execution) -> JsonOutput<'_> {
    JsonOutput {
        result: &execution.result,
        tutorial_completed: execution.tutorial,
    }
}

impl Endpoint for JsonAdapter {
    fn extract_commands(&self) -> Result<Vec<CommandInput>, anyhow::Error> {
        Ok(self.commands.clone())
    }

    fn handle_execution(&self, execution: &Execution) -> Result<(), anyhow::Error> {
        let json = serde_json::to_string(&build_json_output(execution))?;
        println!("{json}");
        Ok(())
    }

    fn handle_error(&self, error: anyhow::Error) -> i32 {
        let json = serde_json::json!({ "error": error.to_string() });
        eprintln!("{json}");
        2
    }
}
