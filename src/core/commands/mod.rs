use std::collections::BTreeMap;
use std::sync::Arc;

mod cd;
mod exit;
mod status;

pub use cd::CdCommand;
pub use exit::ExitCommand;
pub use status::StatusCommand;

use crate::core::state::ShellState;
use crate::input::{CommandLine, ParseError};
use crate::process::{ProcessError, ProcessExecutor};

#[derive(Debug)]
pub enum CommandError {
    ExecutionError(String),
    ProcessError(ProcessError),
    ParseError(ParseError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::ExecutionError(msg) => write!(f, "{}", msg),
            CommandError::ProcessError(err) => write!(f, "{}", err),
            CommandError::ParseError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ProcessError> for CommandError {
    fn from(err: ProcessError) -> Self {
        CommandError::ProcessError(err)
    }
}

impl From<ParseError> for CommandError {
    fn from(err: ParseError) -> Self {
        CommandError::ParseError(err)
    }
}

/// Whether the read-eval loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub trait Command {
    fn execute(&self, args: &[String]) -> Result<Flow, CommandError>;
}

#[derive(Clone)]
enum CommandType {
    Cd(CdCommand),
    Exit(ExitCommand),
    Status(StatusCommand),
}

impl Command for CommandType {
    fn execute(&self, args: &[String]) -> Result<Flow, CommandError> {
        match self {
            CommandType::Cd(cmd) => cmd.execute(args),
            CommandType::Exit(cmd) => cmd.execute(args),
            CommandType::Status(cmd) => cmd.execute(args),
        }
    }
}

/// Routes a tokenized line to a built-in or to the process executor.
#[derive(Clone)]
pub struct CommandExecutor {
    commands: BTreeMap<String, CommandType>,
    process_executor: ProcessExecutor,
}

impl CommandExecutor {
    pub fn new(state: Arc<ShellState>) -> Self {
        let mut commands = BTreeMap::new();
        commands.insert("cd".to_string(), CommandType::Cd(CdCommand::new()));
        commands.insert(
            "exit".to_string(),
            CommandType::Exit(ExitCommand::new(state.clone())),
        );
        commands.insert(
            "status".to_string(),
            CommandType::Status(StatusCommand::new(state.clone())),
        );

        Self {
            commands,
            process_executor: ProcessExecutor::new(state),
        }
    }

    /// Built-ins are matched on the first word and see the raw remaining
    /// words; everything else is parsed for `<`, `>` and `&` and forked.
    pub fn execute(&self, tokens: &[String]) -> Result<Flow, CommandError> {
        let Some((name, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };

        if let Some(cmd) = self.commands.get(name.as_str()) {
            log::debug!("builtin: {}", name);
            return cmd.execute(args);
        }

        if let Some(line) = CommandLine::from_tokens(tokens) {
            self.process_executor.run(&line)?;
        }
        Ok(Flow::Continue)
    }

    pub fn state(&self) -> &Arc<ShellState> {
        self.process_executor.state()
    }
}
