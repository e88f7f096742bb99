mod route;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use route::{read_commands, route_endpoint};

#[derive(Parser)]
#[command(name = "harbor", version, about = "Practice Docker commands in a simulated harbor")]
pub struct Cli {
    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub enum Commands {
    /// Run Docker commands against a saved practice session
    Exec(ExecArgs),
    /// Validate Docker commands without touching any session
    Check(CheckArgs),
    /// Show the command reference, or the usage of one command
    Explain {
        /// Docker command to explain, e.g. "run"
        verb: Option<String>,
    },
    /// Discard a practice session
    Reset(SessionArgs),
    /// List the tutorial steps and the session's progress through them
    Steps(SessionArgs),
}

#[derive(Clone, Copy, Default, ValueEnum)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct SessionArgs {
    /// Session name; each session keeps its own harbor state and tutorial progress
    #[arg(long, default_value = "default")]
    pub session: String,

    /// Directory holding saved sessions
    #[arg(long, env = "HARBOR_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct ExecArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Tutorial step the commands should satisfy
    #[arg(long)]
    pub step: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Command string to run (skips stdin)
    #[arg(long)]
    pub command: Option<String>,
}

#[derive(clap::Args)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct CheckArgs {
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Command string to check (skips stdin)
    #[arg(long)]
    pub command: Option<String>,
}
