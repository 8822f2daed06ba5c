use super::{Command, CommandError, Flow};
use std::env;
use std::path::PathBuf;

#[derive(Clone, Default)]
pub struct CdCommand;

impl CdCommand {
    pub fn new() -> Self {
        Self
    }

    fn home_dir() -> Result<PathBuf, CommandError> {
        env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| CommandError::ExecutionError("cd: HOME not set".to_string()))
    }
}

impl Command for CdCommand {
    fn execute(&self, args: &[String]) -> Result<Flow, CommandError> {
        let target = match args.first() {
            Some(dir) => PathBuf::from(dir),
            None => Self::home_dir()?,
        };

        env::set_current_dir(&target).map_err(|e| {
            CommandError::ExecutionError(format!("cd: {}: {}", target.display(), e))
        })?;
        log::debug!("cwd is now {}", target.display());
        Ok(Flow::Continue)
    }
}
