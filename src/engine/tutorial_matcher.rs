use serde::{Deserialize, Serialize};

use crate::engine::command::Command;
use crate::engine::command_parser::parse;
use crate::engine::normalizer::{RawCommand, normalize};
use crate::engine::result::ParseResult;
use crate::engine::security_filter;
use crate::engine::suggestion::Suggester;

/// What a tutorial step accepts as a correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "expect", rename_all = "snake_case")]
pub enum ExpectedCommand {
    /// Trimmed input must equal the text character for character.
    Exact(String),
    /// Equal after collapsing whitespace and ignoring case.
    Normalized(String),
    /// Normalized comparison against any of the given equivalents.
    AnyOf(Vec<String>),
    /// Same verb and same positional arguments; flags are ignored.
    Semantic(String),
}

/// Whether `result` satisfies `expected`. Rejected commands never match.
pub fn matches(result: &ParseResult, expected: &ExpectedCommand) -> bool {
    let Some(command) = result.command.as_ref().filter(|_| result.valid) else {
        return false;
    };

    match expected {
        ExpectedCommand::Exact(text) => command.raw() == text.trim(),
        ExpectedCommand::Normalized(text) => canonical(command.normalized()) == canonical(text),
        ExpectedCommand::AnyOf(candidates) => {
            let actual = canonical(command.normalized());
            candidates.iter().any(|text| canonical(text) == actual)
        }
        ExpectedCommand::Semantic(pattern) => semantically_equal(command, pattern),
    }
}

fn canonical(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn semantically_equal(command: &Command, pattern: &str) -> bool {
    let expected = normalize(RawCommand::Text(pattern), usize::MAX).and_then(|input| {
        security_filter::check(&input.text)?;
        parse(&input, &Suggester::default())
    });

    match expected {
        Ok(expected) => {
            expected.verb() == command.verb()
                && expected.positionals().len() == command.positionals().len()
                && expected
                    .positionals()
                    .iter()
                    .zip(command.positionals())
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        }
        Err(error) => {
            tracing::warn!(
                pattern,
                %error,
                "tutorial pattern is not a valid command"
            );
            false
        }
    }
}
