use serde::{Deserialize, Serialize};

/// Category of a rejected command, surfaced to callers in `ParseResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InputTypeError,
    EmptyCommand,
    TooLong,
    ControlCharacterError,
    SecurityViolation,
    MissingDockerPrefix,
    UnknownCommand,
    InvalidSyntax,
    NameConflict,
    ContainerNotFound,
    ContainerNotRunning,
    AlreadyRunning,
    ContainerRunning,
    ImageNotFound,
    ImageInUse,
}

/// Failure raised anywhere between normalization and state mutation.
///
/// Container and image references carry the text the user typed, never a
/// resolved internal identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("command input must be text, got {0}")]
    InputType(String),
    #[error("empty command")]
    EmptyCommand,
    #[error("command too long ({length} characters, maximum {max})")]
    TooLong { length: usize, max: usize },
    #[error("control character U+{:04X} is not allowed", codepoint(.0))]
    ControlCharacter(char),
    #[error("shell operator '{pattern}' ({category}) is not allowed")]
    SecurityViolation {
        pattern: &'static str,
        category: &'static str,
    },
    #[error("commands must start with 'docker'")]
    MissingDockerPrefix { input: String },
    #[error("unknown docker command '{verb}'")]
    UnknownCommand {
        verb: String,
        suggestions: Vec<String>,
    },
    #[error("invalid syntax: {message}")]
    InvalidSyntax {
        message: String,
        suggestions: Vec<String>,
    },
    #[error("container name '{0}' is already in use")]
    NameConflict(String),
    #[error("no such container: {0}")]
    ContainerNotFound(String),
    #[error("container '{0}' is not running")]
    ContainerNotRunning(String),
    #[error("container '{0}' is already running")]
    AlreadyRunning(String),
    #[error("container '{0}' is running")]
    ContainerRunning(String),
    #[error("no such image: {0}")]
    ImageNotFound(String),
    #[error("image '{image}' is in use by container '{container}'")]
    ImageInUse { image: String, container: String },
}

fn codepoint(ch: &char) -> u32 {
    u32::from(*ch)
}

impl SimError {
    pub fn invalid_syntax(message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputType(_) => ErrorKind::InputTypeError,
            Self::EmptyCommand => ErrorKind::EmptyCommand,
            Self::TooLong { .. } => ErrorKind::TooLong,
            Self::ControlCharacter(_) => ErrorKind::ControlCharacterError,
            Self::SecurityViolation { .. } => ErrorKind::SecurityViolation,
            Self::MissingDockerPrefix { .. } => ErrorKind::MissingDockerPrefix,
            Self::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            Self::InvalidSyntax { .. } => ErrorKind::InvalidSyntax,
            Self::NameConflict(_) => ErrorKind::NameConflict,
            Self::ContainerNotFound(_) => ErrorKind::ContainerNotFound,
            Self::ContainerNotRunning(_) => ErrorKind::ContainerNotRunning,
            Self::AlreadyRunning(_) => ErrorKind::AlreadyRunning,
            Self::ContainerRunning(_) => ErrorKind::ContainerRunning,
            Self::ImageNotFound(_) => ErrorKind::ImageNotFound,
            Self::ImageInUse { .. } => ErrorKind::ImageInUse,
        }
    }

    /// Candidate corrections attached to the error; empty for most kinds.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::UnknownCommand { suggestions, .. } | Self::InvalidSyntax { suggestions, .. } => {
                suggestions
            }
            _ => &[],
        }
    }
}
