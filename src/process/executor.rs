use std::ffi::CString;
use std::io;
use std::sync::Arc;

use super::redirect::Redirect;
use super::signal::{self, SignalMask};
use super::ProcessError;
use crate::core::state::{ExitOutcome, ShellMode, ShellState};
use crate::input::CommandLine;

/// How a command left the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    Foreground(ExitOutcome),
    Background(libc::pid_t),
}

/// Everything the child needs after fork, built while allocation is still safe.
struct ExecPlan {
    argv: Vec<CString>,
    argv_ptrs: Vec<*const libc::c_char>,
    redirects: Vec<Redirect>,
    not_found: Vec<u8>,
}

impl ExecPlan {
    fn new(command: &CommandLine, background: bool) -> Result<Self, ProcessError> {
        let argv = command
            .argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_str()).map_err(|_| ProcessError::InvalidArgument(arg.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(std::ptr::null());

        let mut redirects = Vec::with_capacity(2);
        match &command.input {
            Some(path) => redirects.push(Redirect::input(path)?),
            None if background => redirects.push(Redirect::null_input()?),
            None => {}
        }
        if let Some(path) = &command.output {
            redirects.push(Redirect::output(path)?);
        }

        Ok(Self {
            argv,
            argv_ptrs,
            redirects,
            not_found: format!("{}: command not found\n", command.program()).into_bytes(),
        })
    }

    /// Runs in the forked child. Never returns.
    fn exec(&self, background: bool, mask: &libc::sigset_t) -> ! {
        signal::reset_for_child(background);
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, mask, std::ptr::null_mut());
        }

        for redirect in &self.redirects {
            if redirect.apply().is_err() {
                redirect.report_failure();
                unsafe { libc::_exit(1) };
            }
        }

        unsafe {
            libc::execvp(self.argv[0].as_ptr(), self.argv_ptrs.as_ptr());
            libc::write(
                libc::STDOUT_FILENO,
                self.not_found.as_ptr().cast(),
                self.not_found.len(),
            );
            libc::_exit(1)
        }
    }
}

#[derive(Clone)]
pub struct ProcessExecutor {
    state: Arc<ShellState>,
}

impl ProcessExecutor {
    pub fn new(state: Arc<ShellState>) -> Self {
        ProcessExecutor { state }
    }

    pub fn state(&self) -> &Arc<ShellState> {
        &self.state
    }

    /// Forks and execs `command`, then either waits for it or hands it to
    /// the job table.
    pub fn run(&self, command: &CommandLine) -> Result<Launch, ProcessError> {
        if let (Some(input), Some(output)) = (&command.input, &command.output) {
            if input == output {
                return Err(ProcessError::SameFileRedirect(input.clone()));
            }
        }

        let background = command.background && self.state.mode() == ShellMode::Normal;
        if command.background && !background {
            log::debug!("foreground-only mode: running {} in foreground", command.program());
        }

        let jobs = self.state.jobs();
        if background && !jobs.has_capacity() {
            return Err(ProcessError::TooManyJobs(jobs.capacity()));
        }

        let plan = ExecPlan::new(command, background)?;

        let mask = SignalMask::block_all()?;
        let pid = unsafe { libc::fork() };
        if pid == -1 {
            let err = io::Error::last_os_error();
            drop(mask);
            log::warn!("fork failed for {}: {}", command.program(), err);
            return Err(ProcessError::ForkFailed(err));
        }
        if pid == 0 {
            plan.exec(background, mask.previous());
        }

        log::debug!(
            "spawned {} as pid {} ({})",
            command.program(),
            pid,
            if background { "background" } else { "foreground" }
        );

        if background {
            let inserted = jobs.insert(pid);
            drop(mask);
            if let Err(e) = inserted {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
                let _ = self.wait_for(pid);
                return Err(e);
            }
            println!("background pid is {}", pid);
            return Ok(Launch::Background(pid));
        }

        drop(mask);
        let outcome = self.wait_foreground(pid)?;
        Ok(Launch::Foreground(outcome))
    }

    fn wait_foreground(&self, pid: libc::pid_t) -> Result<ExitOutcome, ProcessError> {
        self.state.begin_foreground(pid);
        // The child stays a zombie until the interrupt handler can no longer
        // see its pid, so SIGINT never reaches a recycled pid.
        let exited = wait_until_exited(pid);
        self.state.end_foreground();
        exited?;

        let outcome = ExitOutcome::from_wait_status(self.wait_for(pid)?);
        self.state.set_last_result(outcome);
        log::debug!("foreground pid {} finished: {}", pid, outcome);

        if let ExitOutcome::Signaled(_) = outcome {
            println!("{}", outcome);
        }
        Ok(outcome)
    }

    fn wait_for(&self, pid: libc::pid_t) -> Result<libc::c_int, ProcessError> {
        let mut status: libc::c_int = 0;
        loop {
            let ret = unsafe { libc::waitpid(pid, &mut status, 0) };
            if ret == pid {
                return Ok(status);
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(ProcessError::WaitFailed(err));
            }
        }
    }
}

/// Blocks until `pid` has terminated without collecting it.
fn wait_until_exited(pid: libc::pid_t) -> Result<(), ProcessError> {
    loop {
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        let ret = unsafe {
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if ret == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(ProcessError::WaitFailed(err));
        }
    }
}
