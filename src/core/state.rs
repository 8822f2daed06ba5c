use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use crate::process::jobs::JobTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    Normal,
    ForegroundOnly,
}

/// How a waited-on child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ExitOutcome {
    /// Decodes a raw status word as filled in by `waitpid`.
    pub fn from_wait_status(status: libc::c_int) -> Self {
        if libc::WIFSIGNALED(status) {
            ExitOutcome::Signaled(libc::WTERMSIG(status))
        } else {
            ExitOutcome::Exited(libc::WEXITSTATUS(status))
        }
    }
}

impl Default for ExitOutcome {
    fn default() -> Self {
        ExitOutcome::Exited(0)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit value {}", code),
            ExitOutcome::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

/// State shared between the read-eval loop and the signal handlers.
///
/// Everything a handler touches is atomic: `mode`, `foreground` and the
/// job table slots. `last_result` is only ever read and written by the
/// main loop, so its lock is never contended from a handler.
pub struct ShellState {
    foreground_only: AtomicBool,
    foreground: AtomicI32,
    last_result: Mutex<ExitOutcome>,
    jobs: JobTable,
}

impl ShellState {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            foreground_only: AtomicBool::new(false),
            foreground: AtomicI32::new(0),
            last_result: Mutex::new(ExitOutcome::default()),
            jobs: JobTable::with_capacity(max_jobs),
        }
    }

    pub fn mode(&self) -> ShellMode {
        if self.foreground_only.load(Ordering::SeqCst) {
            ShellMode::ForegroundOnly
        } else {
            ShellMode::Normal
        }
    }

    /// Flips the mode and returns the new one. Async-signal-safe.
    pub fn toggle_mode(&self) -> ShellMode {
        if self.foreground_only.fetch_xor(true, Ordering::SeqCst) {
            ShellMode::Normal
        } else {
            ShellMode::ForegroundOnly
        }
    }

    pub fn foreground(&self) -> Option<libc::pid_t> {
        match self.foreground.load(Ordering::SeqCst) {
            pid if pid > 0 => Some(pid),
            _ => None,
        }
    }

    pub fn begin_foreground(&self, pid: libc::pid_t) {
        self.foreground.store(pid, Ordering::SeqCst);
    }

    pub fn end_foreground(&self) {
        self.foreground.store(0, Ordering::SeqCst);
    }

    pub fn last_result(&self) -> ExitOutcome {
        match self.last_result.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set_last_result(&self, outcome: ExitOutcome) {
        match self.last_result.lock() {
            Ok(mut guard) => *guard = outcome,
            Err(poisoned) => *poisoned.into_inner() = outcome,
        }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = ShellState::new(4);
        assert_eq!(state.mode(), ShellMode::Normal);
        assert_eq!(state.foreground(), None);
        assert_eq!(state.last_result(), ExitOutcome::Exited(0));
        assert_eq!(state.jobs().len(), 0);
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let state = ShellState::new(4);
        assert_eq!(state.toggle_mode(), ShellMode::ForegroundOnly);
        assert_eq!(state.mode(), ShellMode::ForegroundOnly);
        assert_eq!(state.toggle_mode(), ShellMode::Normal);
        assert_eq!(state.mode(), ShellMode::Normal);

        for _ in 0..10 {
            state.toggle_mode();
        }
        assert_eq!(state.mode(), ShellMode::Normal);
    }

    #[test]
    fn test_foreground_tracking() {
        let state = ShellState::new(4);
        state.begin_foreground(4242);
        assert_eq!(state.foreground(), Some(4242));
        state.end_foreground();
        assert_eq!(state.foreground(), None);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ExitOutcome::Exited(3).to_string(), "exit value 3");
        assert_eq!(ExitOutcome::Signaled(15).to_string(), "terminated by signal 15");
    }

    #[test]
    fn test_outcome_from_wait_status() {
        // Linux/BSD encoding: exit code in the high byte, signal in the low bits.
        assert_eq!(ExitOutcome::from_wait_status(1 << 8), ExitOutcome::Exited(1));
        assert_eq!(ExitOutcome::from_wait_status(0), ExitOutcome::Exited(0));
        assert_eq!(
            ExitOutcome::from_wait_status(libc::SIGTERM),
            ExitOutcome::Signaled(libc::SIGTERM)
        );
    }
}
