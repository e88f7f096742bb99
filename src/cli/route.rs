use crate::adapter::json_adapter::JsonAdapter;
use crate::adapter::text_adapter::TextAdapter;
use crate::adapter::{CommandInput, Endpoint};

use super::OutputFormat;

/// Collect the commands to run from `--command` or stdin.
///
/// 1. `--command` wins and stdin is never read
/// 2. A JSON object with a `command` field supplies one command; the field
///    may hold any JSON value and is validated later by the normalizer
/// 3. Anything else is plaintext, one command per non-empty line; a line
///    that is not valid UTF-8 is passed on as raw bytes
pub fn read_commands(
    command: Option<&str>,
    mut stdin: impl std::io::Read,
) -> Result<Vec<CommandInput>, anyhow::Error> {
    if let Some(command) = command {
        return Ok(vec![CommandInput::Text(command.to_string())]);
    }

    let mut stdin_input = Vec::new();
    stdin.read_to_end(&mut stdin_input)?;

    // Non-object JSON values ("docker ps", 42, []) fall through to plaintext.
    if let Ok(serde_json::Value::Object(mut object)) =
        serde_json::from_slice::<serde_json::Value>(&stdin_input)
    {
        return match object.remove("command") {
            Some(value) => Ok(vec![CommandInput::Json(value)]),
            None => Err(anyhow::anyhow!(
                "Unknown input format: expected a 'command' field"
            )),
        };
    }

    let commands: Vec<CommandInput> = stdin_input
        .split(|&byte| byte == b'\n')
        .map(|line| line.trim_ascii())
        .filter(|line| !line.is_empty())
        .map(|line| match std::str::from_utf8(line) {
            Ok(text) => CommandInput::Text(text.trim().to_string()),
            Err(_) => CommandInput::Bytes(line.to_vec()),
        })
        .filter(|input| !matches!(input, CommandInput::Text(text) if text.is_empty()))
        .collect();

    if commands.is_empty() {
        return Err(anyhow::anyhow!("no commands provided on stdin"));
    }

    Ok(commands)
}

/// Pick the endpoint for the requested output format.
pub fn route_endpoint(format: OutputFormat, commands: Vec<CommandInput>) -> Box<dyn Endpoint> {
    match format {
        OutputFormat::Text => Box::new(TextAdapter::new(commands)),
        OutputFormat::Json => Box::new(JsonAdapter::new(commands)),
    }
}
