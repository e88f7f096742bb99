use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use harbor::adapter::{self, Session, TutorialGoal};
use harbor::cli::{CheckArgs, Cli, Commands, ExecArgs, SessionArgs, read_commands, route_endpoint};
use harbor::config::{Config, ConfigLoader, DefaultConfigLoader, TutorialContent, TutorialStep};
use harbor::engine::Simulator;
use harbor::engine::grammar::{Verb, command_reference};
use harbor::engine::suggestion::Suggester;
use harbor::state::{DataAccessError, FileStateStore, StateSnapshot, StateStore, TutorialProgress};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let loader = DefaultConfigLoader::new();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match loader.load(&cwd) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("harbor: config error: {e}");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Commands::Exec(args) => run_exec(&args, &config),
        Commands::Check(args) => run_check(&args, &config),
        Commands::Explain { verb } => explain(verb.as_deref(), &config),
        Commands::Reset(args) => reset(&args),
        Commands::Steps(args) => show_steps(&args, &config),
    };

    let exit_code = result.unwrap_or_else(|e| {
        eprintln!("harbor: {e:#}");
        2
    });
    ExitCode::from(exit_code as u8)
}

/// Logs go to stderr so they never mix with command output.
/// `HARBOR_LOG` takes `RUST_LOG`-style directives.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("HARBOR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("harbor={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn state_store(args: &SessionArgs) -> FileStateStore {
    FileStateStore::new(
        args.state_dir
            .clone()
            .unwrap_or_else(FileStateStore::default_root),
    )
}

/// An invalid session id is fatal; unreadable or corrupt state falls back
/// to an empty snapshot.
fn load_snapshot(store: &impl StateStore, session_id: &str) -> Result<StateSnapshot, anyhow::Error> {
    match store.load(session_id) {
        Ok(snapshot) => Ok(snapshot),
        Err(e @ DataAccessError::InvalidSessionId(_)) => Err(e.into()),
        Err(e) => {
            tracing::warn!(session = session_id, error = %e, "could not load session state, starting empty");
            Ok(StateSnapshot::new())
        }
    }
}

fn run_exec(args: &ExecArgs, config: &Config) -> Result<i32, anyhow::Error> {
    let expected = args
        .step
        .as_deref()
        .map(|id| {
            config
                .expected_command(id)
                .map(|expected| (id, expected))
                .with_context(|| {
                    format!("unknown tutorial step '{id}'; run `harbor steps` to list them")
                })
        })
        .transpose()?;

    let store = state_store(&args.session);
    let session_id = args.session.session.as_str();
    let mut snapshot = load_snapshot(&store, session_id)?;

    let commands = read_commands(args.command.as_deref(), std::io::stdin())?;
    let endpoint = route_endpoint(args.format, commands);
    let simulator = Simulator::new(&config.limits());

    let summary = adapter::run(
        endpoint.as_ref(),
        &simulator,
        Session::Stateful {
            snapshot: &mut snapshot,
            goal: expected
                .as_ref()
                .map(|(step_id, expected)| TutorialGoal {
                    step_id: *step_id,
                    expected,
                }),
        },
    );

    if summary.dirty {
        store
            .save(session_id, &snapshot)
            .context("failed to save session state")?;
    }
    Ok(summary.exit_code)
}

fn run_check(args: &CheckArgs, config: &Config) -> Result<i32, anyhow::Error> {
    let commands = read_commands(args.command.as_deref(), std::io::stdin())?;
    let endpoint = route_endpoint(args.format, commands);
    let simulator = Simulator::new(&config.limits());
    Ok(adapter::run(endpoint.as_ref(), &simulator, Session::CheckOnly).exit_code)
}

fn explain(verb: Option<&str>, config: &Config) -> Result<i32, anyhow::Error> {
    match explain_text(verb, &Suggester::from_limits(&config.limits())) {
        Ok(text) => {
            print!("{text}");
            Ok(0)
        }
        Err(message) => {
            eprintln!("{message}");
            Ok(1)
        }
    }
}

fn explain_text(verb: Option<&str>, suggester: &Suggester) -> Result<String, String> {
    let Some(token) = verb else {
        return Ok(command_reference());
    };
    if let Some(verb) = Verb::from_token(token) {
        return Ok(verb.spec().help_text());
    }

    let lowered = token.to_ascii_lowercase();
    let suggestions = suggester.suggest(&lowered, Verb::ALL.into_iter().map(Verb::as_str));
    let mut message = format!("unknown command '{token}'");
    if !suggestions.is_empty() {
        message.push_str(&format!("; did you mean: {}?", suggestions.join(", ")));
    }
    message.push_str("\n\n");
    message.push_str(&command_reference());
    Err(message)
}

fn reset(args: &SessionArgs) -> Result<i32, anyhow::Error> {
    let removed = state_store(args).remove(&args.session)?;
    if removed {
        println!("Session '{}' cleared; the harbor is empty and tutorial progress starts over.", args.session);
    } else {
        println!("Session '{}' had no saved state.", args.session);
    }
    Ok(0)
}

fn show_steps(args: &SessionArgs, config: &Config) -> Result<i32, anyhow::Error> {
    let snapshot = load_snapshot(&state_store(args), &args.session)?;
    print!("{}", steps_text(&config.steps(), snapshot.progress()));
    Ok(0)
}

/// Numbered steps with a completion mark, then the overall progress and
/// the next step to work on.
fn steps_text(steps: &[TutorialStep], progress: &TutorialProgress) -> String {
    let mut text = String::new();
    for (number, step) in steps.iter().enumerate() {
        let title = step.title.as_deref().unwrap_or(step.id.as_str());
        let mark = if progress.is_completed(&step.id) { "[x]" } else { "[ ]" };
        text.push_str(&format!("{}. {mark} {title} ({})", number + 1, step.id));
        match progress.attempts(&step.id) {
            0 => {}
            1 => text.push_str(" - 1 attempt"),
            n => text.push_str(&format!(" - {n} attempts")),
        }
        text.push('\n');
        if let Some(hint) = &step.hint {
            text.push_str(&format!("   {hint}\n"));
        }
    }

    let ids = || steps.iter().map(|step| step.id.as_str());
    text.push_str(&format!(
        "\nProgress: {:.0}% ({}/{} steps)\n",
        progress.percentage(ids()),
        progress.completed_count(ids()),
        steps.len()
    ));
    match progress.next_step(ids()) {
        Some(id) => text.push_str(&format!("Next: harbor exec --step {id}\n")),
        None => text.push_str("Every step is complete. Well sailed!\n"),
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor::config::builtin_steps;
    use indoc::indoc;
    use rstest::rstest;

    #[rstest]
    fn explain_without_verb_lists_every_command() {
        let text = explain_text(None, &Suggester::default()).unwrap();
        for verb in Verb::ALL {
            assert!(text.contains(verb.as_str()), "missing {verb}");
        }
    }

    #[rstest]
    #[case::lowercase("run")]
    #[case::uppercase("RUN")]
    fn explain_verb_shows_usage(#[case] verb: &str) {
        let text = explain_text(Some(verb), &Suggester::default()).unwrap();
        assert!(text.starts_with("docker run "));
    }

    #[rstest]
    fn explain_unknown_verb_suggests_alternatives() {
        let err = explain_text(Some("rn"), &Suggester::default()).unwrap_err();
        assert!(err.starts_with("unknown command 'rn'; did you mean: "));
        assert!(err.contains("Supported commands:"));
    }

    fn step(id: &str) -> TutorialStep {
        TutorialStep {
            id: id.to_string(),
            title: None,
            expect: Some("docker ps".to_string()),
            match_mode: None,
            equivalents: None,
            hint: None,
        }
    }

    fn at_noon() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-11-17T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    #[rstest]
    fn steps_text_numbers_builtin_steps() {
        let text = steps_text(&builtin_steps(), &TutorialProgress::default());
        assert!(text.starts_with("1. [ ] "));
        assert!(text.contains("(first-run)"));
        assert!(text.contains("Progress: 0% (0/5 steps)"));
        assert!(text.ends_with("Next: harbor exec --step first-run\n"));
    }

    #[rstest]
    fn steps_text_falls_back_to_id_without_title() {
        assert_eq!(
            steps_text(&[step("custom")], &TutorialProgress::default()),
            indoc! {"
                1. [ ] custom (custom)

                Progress: 0% (0/1 steps)
                Next: harbor exec --step custom
            "}
        );
    }

    #[rstest]
    fn steps_text_shows_completion_and_attempts() {
        let steps = [step("a"), step("b"), step("c"), step("d")];
        let mut progress = TutorialProgress::default();
        progress.record_attempt("a", false, at_noon());
        progress.record_attempt("a", true, at_noon());
        progress.record_attempt("c", true, at_noon());
        progress.record_attempt("b", false, at_noon());

        assert_eq!(
            steps_text(&steps, &progress),
            indoc! {"
                1. [x] a (a) - 2 attempts
                2. [ ] b (b) - 1 attempt
                3. [x] c (c) - 1 attempt
                4. [ ] d (d)

                Progress: 50% (2/4 steps)
                Next: harbor exec --step b
            "}
        );
    }

    #[rstest]
    fn steps_text_all_complete() {
        let mut progress = TutorialProgress::default();
        progress.record_attempt("only", true, at_noon());
        let text = steps_text(&[step("only")], &progress);
        assert!(text.contains("Progress: 100% (1/1 steps)"));
        assert!(text.ends_with("Every step is complete. Well sailed!\n"));
    }
}
