pub mod command;
pub mod command_parser;
mod error;
pub mod feedback;
pub mod grammar;
pub mod lifecycle;
pub mod normalizer;
pub mod result;
pub mod security_filter;
pub mod simulator;
pub mod suggestion;
pub mod tutorial_matcher;

pub use command::{Command, FlagValue};
pub use error::*;
pub use lifecycle::{Outcome, StateDelta};
pub use normalizer::RawCommand;
pub use result::{Execution, ParseResult};
pub use simulator::Simulator;
pub use tutorial_matcher::ExpectedCommand;
