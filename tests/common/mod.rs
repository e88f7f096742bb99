use harbor::engine::{ErrorKind, Execution, ParseResult, Simulator};
use harbor::state::{ContainerState, StateSnapshot};

/// Function pointer type for asserting expected results in `#[case]` attributes.
pub type ResultAssertion = fn(&ParseResult);

pub fn assert_valid(actual: &ParseResult) {
    assert!(
        actual.valid,
        "expected valid, got {:?}: {}",
        actual.error_kind, actual.message
    );
}

fn assert_kind(actual: &ParseResult, expected: ErrorKind) {
    assert_eq!(
        actual.error_kind,
        Some(expected),
        "expected {:?}, got {:?}: {}",
        expected,
        actual.error_kind,
        actual.message
    );
    assert!(!actual.valid);
    assert!(actual.state_delta.is_none());
}

pub fn assert_security_violation(actual: &ParseResult) {
    assert_kind(actual, ErrorKind::SecurityViolation);
}

pub fn assert_invalid_syntax(actual: &ParseResult) {
    assert_kind(actual, ErrorKind::InvalidSyntax);
}

pub fn assert_unknown_command(actual: &ParseResult) {
    assert_kind(actual, ErrorKind::UnknownCommand);
}

pub fn assert_missing_prefix(actual: &ParseResult) {
    assert_kind(actual, ErrorKind::MissingDockerPrefix);
}

/// Run `commands` in order against `snapshot` with default limits.
pub fn run_all(snapshot: &mut StateSnapshot, commands: &[&str]) -> Vec<Execution> {
    let simulator = Simulator::default();
    commands
        .iter()
        .map(|command| simulator.execute((*command).into(), snapshot, None))
        .collect()
}

pub fn run_one(snapshot: &mut StateSnapshot, command: &str) -> Execution {
    Simulator::default().execute(command.into(), snapshot, None)
}

/// State of the most recent record named `name`, removed records included.
pub fn container_state(snapshot: &StateSnapshot, name: &str) -> Option<ContainerState> {
    snapshot
        .containers()
        .iter()
        .rev()
        .find(|c| c.name == name)
        .map(|c| c.state)
}
