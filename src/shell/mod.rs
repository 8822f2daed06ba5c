use std::io::{self, Write};
use std::sync::Arc;

use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

mod executor;

use crate::{
    core::{
        commands::{CommandExecutor, Flow},
        config::Config,
        state::ShellState,
    },
    error::ShellError,
    flags::Flags,
};

use executor::CommandHandler;

pub struct Shell {
    pub(crate) editor: DefaultEditor,
    pub(crate) config: Config,
    pub(crate) flags: Flags,
    pub(crate) executor: CommandExecutor,
}

impl Shell {
    /// Signal handlers must already be installed for `state`.
    pub fn new(flags: Flags, config: Config, state: Arc<ShellState>) -> Result<Self, ShellError> {
        let mut editor = DefaultEditor::new()?;
        editor.set_auto_add_history(true);

        let executor = CommandExecutor::new(state);

        Ok(Shell {
            editor,
            config,
            flags,
            executor,
        })
    }

    pub fn run(&mut self) -> Result<(), ShellError> {
        loop {
            self.report_finished_jobs(&mut io::stdout());

            match self.editor.readline(&self.config.prompt) {
                Ok(line) => match self.execute_command(&line) {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => self.report_error(&e),
                },
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    // End of input behaves like `exit`.
                    if let Err(e) = self.execute_command("exit") {
                        self.report_error(&e);
                    }
                    break;
                }
                Err(e) => {
                    if !self.flags.is_set("quiet") {
                        eprintln!("Error: {}", e);
                    }
                    continue;
                }
            }
        }

        log::info!("smallsh exiting");
        Ok(())
    }

    /// Prints one line per background job the reaper has collected.
    fn report_finished_jobs(&self, out: &mut impl Write) {
        for job in self.executor.state().jobs().drain_finished() {
            log::debug!("background pid {} ran for {:?}", job.pid, job.runtime);
            if let Err(e) = writeln!(out, "background pid {} is done: {}", job.pid, job.outcome) {
                log::warn!("failed to report job {}: {}", job.pid, e);
            }
        }
        let _ = out.flush();
    }

    fn report_error(&self, error: &dyn std::error::Error) {
        log::warn!("{}", error);
        if !self.flags.is_set("quiet") {
            eprintln!("smallsh: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigPaths;
    use std::path::Path;

    fn quiet_shell(state: Arc<ShellState>) -> Shell {
        let config = Config::new(ConfigPaths::from_home(Path::new("/home/testuser")));
        let mut flags = Flags::new();
        flags.parse(&["-q".to_string()]).expect("flags");
        Shell::new(flags, config, state).expect("shell")
    }

    #[test]
    fn test_finished_jobs_reported_in_quiet_mode() {
        let state = Arc::new(ShellState::new(4));
        state.jobs().insert(4242).expect("insert");
        assert!(state.jobs().remove_by_pid(4242, 0));
        let shell = quiet_shell(state);

        let mut out = Vec::new();
        shell.report_finished_jobs(&mut out);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "background pid 4242 is done: exit value 0\n"
        );

        let mut again = Vec::new();
        shell.report_finished_jobs(&mut again);
        assert!(again.is_empty());
    }
}
