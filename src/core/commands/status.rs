use std::sync::Arc;

use super::{Command, CommandError, Flow};
use crate::core::state::ShellState;

/// Prints how the last foreground command ended.
#[derive(Clone)]
pub struct StatusCommand {
    state: Arc<ShellState>,
}

impl StatusCommand {
    pub fn new(state: Arc<ShellState>) -> Self {
        Self { state }
    }

    pub fn message(&self) -> String {
        self.state.last_result().to_string()
    }
}

impl Command for StatusCommand {
    fn execute(&self, _args: &[String]) -> Result<Flow, CommandError> {
        println!("{}", self.message());
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ExitOutcome;

    #[test]
    fn test_status_messages() {
        let state = Arc::new(ShellState::new(4));
        let cmd = StatusCommand::new(state.clone());
        assert_eq!(cmd.message(), "exit value 0");

        state.set_last_result(ExitOutcome::Signaled(2));
        assert_eq!(cmd.message(), "terminated by signal 2");
        assert_eq!(cmd.execute(&[]).expect("status"), Flow::Continue);
    }
}
