use std::collections::BTreeMap;

use crate::engine::SimError;
use crate::engine::command::{Command, FlagValue};
use crate::engine::grammar::{Arity, FlagSpec, PositionalKind, ValueKind, Verb, VerbSpec};
use crate::engine::normalizer::NormalizedInput;
use crate::engine::suggestion::Suggester;
use crate::state::{ImageRef, validate_container_name};

/// Parse a normalized, filtered command against the grammar table.
///
/// - The first token must be `docker` (any casing)
/// - The second token selects the verb; unknown verbs become
///   `UnknownCommand` with suggestions from `suggester`
/// - Long flags accept `--flag value` and `--flag=value`
/// - For `run`, every token after the image belongs to the container command
pub fn parse(input: &NormalizedInput, suggester: &Suggester) -> Result<Command, SimError> {
    let tokens: Vec<&str> = input.text.split(' ').collect();

    match tokens.first() {
        Some(first) if first.eq_ignore_ascii_case("docker") => {}
        _ => {
            return Err(SimError::MissingDockerPrefix {
                input: input.text.clone(),
            });
        }
    }

    let Some(verb_token) = tokens.get(1) else {
        return Err(SimError::invalid_syntax(
            "missing command after 'docker'; expected: docker COMMAND [OPTIONS]",
        ));
    };

    let Some(verb) = Verb::from_token(verb_token) else {
        let suggestions = suggester.suggest(verb_token, Verb::ALL.into_iter().map(Verb::as_str));
        return Err(SimError::UnknownCommand {
            verb: (*verb_token).to_string(),
            suggestions,
        });
    };

    let spec = verb.spec();
    let mut flags: BTreeMap<String, FlagValue> = BTreeMap::new();
    let mut positionals: Vec<String> = Vec::new();
    let mut collecting_command = false;
    let mut rest = tokens[2..].iter();

    while let Some(&token) = rest.next() {
        if collecting_command || !is_flag(token) {
            positionals.push(token.to_string());
            if spec.has_variadic() && positionals.len() >= spec.fixed_positionals() {
                collecting_command = true;
            }
            continue;
        }

        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if token.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };

        let flag = spec
            .find_flag(name)
            .ok_or_else(|| unknown_flag(spec, name, suggester))?;

        if !flag.repeatable && flags.contains_key(flag.key) {
            return Err(SimError::invalid_syntax(format!(
                "flag '{name}' may only be given once; usage: {}",
                spec.usage()
            )));
        }

        match flag.arity {
            Arity::Switch => {
                if inline_value.is_some() {
                    return Err(SimError::invalid_syntax(format!(
                        "flag '{name}' does not take a value; write it as '{name}'"
                    )));
                }
                flags.insert(flag.key.to_string(), FlagValue::Present(true));
            }
            Arity::Value(kind) => {
                let value = match inline_value {
                    Some(value) => value,
                    None => rest.next().copied().ok_or_else(|| {
                        SimError::invalid_syntax(format!(
                            "flag '{name}' needs a value; expected: {}",
                            flag.signature()
                        ))
                    })?,
                };
                validate_flag_value(flag, name, kind, value)?;
                match flags
                    .entry(flag.key.to_string())
                    .or_insert_with(|| FlagValue::Values(Vec::new()))
                {
                    FlagValue::Values(values) => values.push(value.to_string()),
                    FlagValue::Present(_) => {}
                }
            }
        }
    }

    check_positionals(spec, &positionals)?;

    Ok(Command::new(
        input.raw.clone(),
        input.text.clone(),
        verb,
        flags,
        positionals,
    ))
}

fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn unknown_flag(spec: &VerbSpec, name: &str, suggester: &Suggester) -> SimError {
    let verb = spec.verb;
    if spec.flags.is_empty() {
        return SimError::invalid_syntax(format!(
            "unknown flag '{name}': 'docker {verb}' takes no options; usage: {}",
            spec.usage()
        ));
    }

    let accepted = spec
        .flags
        .iter()
        .map(FlagSpec::display_name)
        .collect::<Vec<_>>()
        .join(", ");
    SimError::InvalidSyntax {
        message: format!("unknown flag '{name}' for 'docker {verb}'; accepted options: {accepted}"),
        suggestions: suggester.suggest(name, spec.flag_names()),
    }
}

fn validate_flag_value(
    flag: &FlagSpec,
    name: &str,
    kind: ValueKind,
    value: &str,
) -> Result<(), SimError> {
    let problem = match kind {
        ValueKind::PortMapping => parse_port_mapping(value).err().map(|_| {
            format!(
                "invalid value '{value}' for '{name}'; expected {} with ports 1-65535 (e.g. -p 8080:80)",
                flag.placeholder
            )
        }),
        ValueKind::ContainerName => validate_container_name(value).err(),
        ValueKind::EnvAssignment => match value.split_once('=') {
            Some((key, _)) if !key.is_empty() => None,
            _ => Some(format!(
                "invalid value '{value}' for '{name}'; expected {} (e.g. -e MODE=production)",
                flag.placeholder
            )),
        },
        ValueKind::ImageRef => ImageRef::parse(value).err(),
    };

    match problem {
        Some(message) => Err(SimError::invalid_syntax(message)),
        None => Ok(()),
    }
}

/// Parse `HOST:CONTAINER` into a port pair.
pub fn parse_port_mapping(value: &str) -> Result<(u16, u16), String> {
    let parse_port = |part: &str| -> Option<u16> {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        part.parse::<u16>().ok().filter(|port| *port > 0)
    };

    value
        .split_once(':')
        .and_then(|(host, container)| Some((parse_port(host)?, parse_port(container)?)))
        .ok_or_else(|| format!("'{value}' is not a HOST:CONTAINER port mapping"))
}

/// Parse `KEY=VALUE`, already validated by the grammar.
pub fn parse_env_assignment(value: &str) -> Option<(&str, &str)> {
    value.split_once('=')
}

fn check_positionals(spec: &VerbSpec, positionals: &[String]) -> Result<(), SimError> {
    let verb = spec.verb;

    for (index, positional) in spec.positionals.iter().enumerate() {
        match positionals.get(index) {
            None if positional.required => {
                return Err(SimError::invalid_syntax(format!(
                    "'docker {verb}' requires {}; usage: {}",
                    positional.name,
                    spec.usage()
                )));
            }
            None => {}
            Some(_) if positional.variadic => break,
            Some(value) => validate_positional(positional.kind, value)?,
        }
    }

    if !spec.has_variadic() && positionals.len() > spec.positionals.len() {
        let extra = &positionals[spec.positionals.len()];
        return Err(SimError::invalid_syntax(format!(
            "unexpected argument '{extra}'; usage: {}",
            spec.usage()
        )));
    }

    Ok(())
}

fn validate_positional(kind: PositionalKind, value: &str) -> Result<(), SimError> {
    let result = match kind {
        PositionalKind::ImageRef => ImageRef::parse(value).map(|_| ()),
        PositionalKind::ContainerRef => validate_container_name(value),
        PositionalKind::ObjectRef => {
            validate_container_name(value).or_else(|_| ImageRef::parse(value).map(|_| ()))
        }
        PositionalKind::BuildPath | PositionalKind::Command => Ok(()),
    };
    result.map_err(SimError::invalid_syntax)
}
