use chrono::{DateTime, Utc};

use crate::config::Limits;
use crate::engine::SimError;
use crate::engine::command::Command;
use crate::engine::command_parser;
use crate::engine::feedback::{render_failure, render_success, render_valid};
use crate::engine::lifecycle::apply;
use crate::engine::normalizer::{RawCommand, normalize};
use crate::engine::result::{Execution, ParseResult};
use crate::engine::security_filter;
use crate::engine::suggestion::Suggester;
use crate::engine::tutorial_matcher::{ExpectedCommand, matches};
use crate::state::StateSnapshot;

/// The command pipeline: normalize, filter, parse, apply, render, match.
///
/// Holds no session state; every call receives the snapshot it works on.
#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    limits: Limits,
    suggester: Suggester,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(&Limits::default())
    }
}

impl Simulator {
    pub fn new(limits: &Limits) -> Self {
        Self {
            limits: *limits,
            suggester: Suggester::from_limits(limits),
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run the read-only front half of the pipeline.
    pub fn parse(&self, raw: RawCommand<'_>) -> Result<Command, SimError> {
        let input = normalize(raw, self.limits.max_command_length)?;
        tracing::debug!(normalized = input.text.as_str(), "normalized input");

        security_filter::check(&input.text)?;

        let command = command_parser::parse(&input, &self.suggester)?;
        tracing::debug!(
            verb = %command.verb(),
            positionals = ?command.positionals(),
            "parsed command"
        );
        Ok(command)
    }

    /// Validate a command without touching any state.
    pub fn check(&self, raw: RawCommand<'_>) -> ParseResult {
        match self.parse(raw) {
            Ok(command) => render_valid(&command),
            Err(error) => rejected(&error),
        }
    }

    /// Run one command against `snapshot`.
    ///
    /// A rejected command leaves the snapshot untouched and reports
    /// `dirty: false`. When `expected` is given the result is also matched
    /// against the tutorial step.
    pub fn execute(
        &self,
        raw: RawCommand<'_>,
        snapshot: &mut StateSnapshot,
        expected: Option<&ExpectedCommand>,
    ) -> Execution {
        self.execute_at(raw, snapshot, expected, Utc::now())
    }

    /// [`Simulator::execute`] with an explicit clock.
    pub fn execute_at(
        &self,
        raw: RawCommand<'_>,
        snapshot: &mut StateSnapshot,
        expected: Option<&ExpectedCommand>,
        now: DateTime<Utc>,
    ) -> Execution {
        let applied = self.parse(raw).and_then(|command| {
            let outcome = apply(&command, snapshot, now)?;
            Ok((command, outcome))
        });

        let (result, dirty) = match applied {
            Ok((command, outcome)) => (
                render_success(&command, &outcome, now),
                outcome.state_delta().is_some(),
            ),
            Err(error) => (rejected(&error), false),
        };

        let tutorial = expected.map(|expected| matches(&result, expected));
        Execution {
            result,
            dirty,
            tutorial,
        }
    }
}

fn rejected(error: &SimError) -> ParseResult {
    tracing::debug!(kind = ?error.kind(), %error, "command rejected");
    render_failure(error)
}
