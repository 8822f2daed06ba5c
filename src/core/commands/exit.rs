use std::sync::Arc;

use super::{Command, CommandError, Flow};
use crate::core::state::ShellState;

/// Kills and collects every background job, then asks the loop to stop.
#[derive(Clone)]
pub struct ExitCommand {
    state: Arc<ShellState>,
}

impl ExitCommand {
    pub fn new(state: Arc<ShellState>) -> Self {
        Self { state }
    }
}

impl Command for ExitCommand {
    fn execute(&self, _args: &[String]) -> Result<Flow, CommandError> {
        let terminated = self.state.jobs().terminate_all()?;
        log::info!("exit: terminated {} background job(s)", terminated);
        Ok(Flow::Exit)
    }
}
