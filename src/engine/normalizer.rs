use crate::engine::SimError;

/// Untyped command input as it arrives from a caller.
///
/// Only text is a valid command; the other variants exist so that callers
/// handing over whatever they received (stdin bytes, a JSON field) get a
/// typed rejection instead of a panic.
#[derive(Debug, Clone, Copy)]
pub enum RawCommand<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Json(&'a serde_json::Value),
}

impl<'a> From<&'a str> for RawCommand<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for RawCommand<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

impl<'a> RawCommand<'a> {
    fn as_text(self) -> Result<&'a str, SimError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| SimError::InputType("bytes that are not valid UTF-8".to_string())),
            Self::Json(serde_json::Value::String(text)) => Ok(text.as_str()),
            Self::Json(value) => Err(SimError::InputType(json_type_name(value).to_string())),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Input that passed type, length and character checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    /// Trimmed input with its original spacing and casing.
    pub raw: String,
    /// Trimmed input with space runs collapsed to one space; casing preserved.
    pub text: String,
}

/// Validate and normalize raw input.
///
/// Checks run in order: type, emptiness (after trimming), length (in
/// characters, after trimming), control characters. Any character below
/// U+0020 other than a plain space is rejected, including tabs.
pub fn normalize(raw: RawCommand<'_>, max_length: usize) -> Result<NormalizedInput, SimError> {
    let text = raw.as_text()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SimError::EmptyCommand);
    }

    let length = trimmed.chars().count();
    if length > max_length {
        return Err(SimError::TooLong {
            length,
            max: max_length,
        });
    }

    if let Some(ch) = trimmed.chars().find(|c| u32::from(*c) < 0x20) {
        return Err(SimError::ControlCharacter(ch));
    }

    let collapsed = trimmed
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(NormalizedInput {
        raw: trimmed.to_string(),
        text: collapsed,
    })
}
