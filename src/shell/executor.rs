use crate::core::commands::{CommandError, Flow};
use crate::input::{expand_pid, tokenize};

pub(crate) trait CommandHandler {
    fn execute_command(&mut self, line: &str) -> Result<Flow, CommandError>;
}

impl CommandHandler for super::Shell {
    fn execute_command(&mut self, line: &str) -> Result<Flow, CommandError> {
        // Skip empty commands early
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }

        // Limits apply to the line as typed; `$$` never splits a word.
        let pid = std::process::id();
        let tokens: Vec<String> = tokenize(line)?
            .iter()
            .map(|word| expand_pid(word, pid).into_owned())
            .collect();
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }

        log::debug!("executing: {}", tokens.join(" "));
        self.executor.execute(&tokens)
    }
}
