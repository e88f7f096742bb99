use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::grammar::Verb;

/// Value recorded for a flag: presence for switches, every given value
/// (in order) for value flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Present(bool),
    Values(Vec<String>),
}

/// A command that passed normalization, the security filter and the
/// grammar. Only the parser constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    raw: String,
    normalized: String,
    verb: Verb,
    flags: BTreeMap<String, FlagValue>,
    positionals: Vec<String>,
}

impl Command {
    pub(crate) fn new(
        raw: String,
        normalized: String,
        verb: Verb,
        flags: BTreeMap<String, FlagValue>,
        positionals: Vec<String>,
    ) -> Self {
        Self {
            raw,
            normalized,
            verb,
            flags,
            positionals,
        }
    }

    /// Trimmed input exactly as typed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Single-spaced input with the user's casing.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    /// All values given for a value flag; empty for switches and absent flags.
    pub fn flag_values(&self, key: &str) -> &[String] {
        match self.flags.get(key) {
            Some(FlagValue::Values(values)) => values,
            _ => &[],
        }
    }

    /// Last value given for a value flag.
    pub fn flag_value(&self, key: &str) -> Option<&str> {
        self.flag_values(key).last().map(String::as_str)
    }
}
