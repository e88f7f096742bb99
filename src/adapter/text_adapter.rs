use crate::engine::Execution;

use super::{CommandInput, Endpoint};

/// Human-readable endpoint for interactive use.
pub struct TextAdapter {
    commands: Vec<CommandInput>,
}

impl TextAdapter {
    pub fn new(commands: Vec<CommandInput>) -> Self {
        Self { commands }
    }
}

/// Render an execution the way a terminal user reads it: simulated Docker
/// output first, then the status line and the harbor metaphor.
pub fn build_text_output(execution: &Execution) -> String {
    let result = &execution.result;
    let mut lines: Vec<String> = Vec::new();

    if !result.output.is_empty() {
        lines.push(result.output.trim_end().to_string());
    }

    match result.error_kind {
        Some(kind) => lines.push(format!("Error [{kind:?}]: {}", result.message)),
        None => lines.push(result.message.clone()),
    }

    if !result.suggestions.is_empty() {
        lines.push(format!("Did you mean: {}", result.suggestions.join(", ")));
    }

    if !result.metaphor.is_empty() {
        lines.push(format!("Harbor: {}", result.metaphor));
    }

    match execution.tutorial {
        Some(true) => lines.push("Tutorial: step complete".to_string()),
        Some(false) => lines.push("Tutorial: not the command this step expects".to_string()),
        None => {}
    }

    lines.join("\n")
}

impl Endpoint for TextAdapter {
    fn extract_commands(&self) -> Result<Vec<CommandInput>, anyhow::Error> {
        Ok(self.commands.clone())
    }

    fn handle_execution(&self, execution: &Execution) -> Result<(), anyhow::Error> {
        println!("{}", build_text_output(execution));
        Ok(())
    }

    fn handle_error(&self, error: anyhow::Error) -> i32 {
        eprintln!("harbor: {error:#}");
        2
    }
}
