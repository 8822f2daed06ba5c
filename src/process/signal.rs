use std::io;
use std::mem::MaybeUninit;
use std::sync::{Arc, OnceLock};

use libc::c_int;
use signal_hook::consts::signal::{SIGCHLD, SIGINT, SIGTSTP};

use crate::core::state::{ShellMode, ShellState};
use crate::process::ProcessError;

/// The state the handlers act on. Registered once by `install`.
static CONTEXT: OnceLock<Arc<ShellState>> = OnceLock::new();

const ENTER_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
const EXIT_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode\n";

/// Registers `state` with the handlers and installs them for SIGINT,
/// SIGTSTP and SIGCHLD.
pub fn install(state: Arc<ShellState>) -> Result<(), ProcessError> {
    CONTEXT
        .set(state)
        .map_err(|_| ProcessError::AlreadyInstalled)?;

    set_handler(SIGINT, handle_interrupt)?;
    set_handler(SIGTSTP, handle_mode_toggle)?;
    set_handler(SIGCHLD, handle_child)?;
    log::debug!("signal handlers installed");
    Ok(())
}

fn set_handler(signal: c_int, handler: extern "C" fn(c_int)) -> Result<(), ProcessError> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        // No handler runs while another one is in progress.
        libc::sigfillset(&mut action.sa_mask);

        if libc::sigaction(signal, &action, std::ptr::null_mut()) == -1 {
            return Err(ProcessError::SignalError(format!(
                "cannot install handler for signal {}: {}",
                signal,
                io::Error::last_os_error()
            )));
        }
    }
    Ok(())
}

/// Forwards an interrupt to the foreground child, if there is one.
extern "C" fn handle_interrupt(_: c_int) {
    let _errno = ErrnoGuard::save();
    let Some(state) = CONTEXT.get() else {
        return;
    };

    if let Some(pid) = state.foreground() {
        unsafe {
            libc::kill(pid, SIGINT);
        }
        write_stdout(b"\n");
    }
}

extern "C" fn handle_mode_toggle(_: c_int) {
    let _errno = ErrnoGuard::save();
    let Some(state) = CONTEXT.get() else {
        return;
    };

    match state.toggle_mode() {
        ShellMode::ForegroundOnly => write_stdout(ENTER_FOREGROUND_ONLY),
        ShellMode::Normal => write_stdout(EXIT_FOREGROUND_ONLY),
    }
}

/// Collects finished background jobs. Reporting happens in the main loop.
extern "C" fn handle_child(_: c_int) {
    let _errno = ErrnoGuard::save();
    if let Some(state) = CONTEXT.get() {
        state.jobs().reap_finished();
    }
}

/// Raw write(2) to stdout; the only output a handler performs.
fn write_stdout(bytes: &[u8]) {
    unsafe {
        libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Puts signal dispositions back the way a freshly forked child needs them.
/// Foreground children die on SIGINT; background children ignore it.
/// Called between fork and exec, so it must stay async-signal-safe.
pub(crate) fn reset_for_child(background: bool) {
    unsafe {
        let interrupt = if background {
            libc::SIG_IGN
        } else {
            libc::SIG_DFL
        };
        libc::signal(SIGINT, interrupt);
        libc::signal(SIGTSTP, libc::SIG_IGN);
        libc::signal(SIGCHLD, libc::SIG_DFL);
    }
}

/// Blocks every signal for the calling thread until dropped.
pub struct SignalMask {
    previous: libc::sigset_t,
}

impl SignalMask {
    pub fn block_all() -> Result<Self, ProcessError> {
        unsafe {
            let mut all = MaybeUninit::<libc::sigset_t>::uninit();
            let mut previous = MaybeUninit::<libc::sigset_t>::uninit();
            libc::sigfillset(all.as_mut_ptr());

            let rc = libc::pthread_sigmask(libc::SIG_BLOCK, all.as_ptr(), previous.as_mut_ptr());
            if rc != 0 {
                return Err(ProcessError::SignalError(format!(
                    "cannot block signals: {}",
                    io::Error::from_raw_os_error(rc)
                )));
            }

            Ok(Self {
                previous: previous.assume_init(),
            })
        }
    }

    /// The mask that was active before this guard. A forked child restores
    /// it before exec, since the mask survives exec.
    pub(crate) fn previous(&self) -> &libc::sigset_t {
        &self.previous
    }
}

impl Drop for SignalMask {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut());
        }
    }
}

/// Restores the interrupted code's errno when a handler returns.
struct ErrnoGuard(c_int);

impl ErrnoGuard {
    fn save() -> Self {
        ErrnoGuard(unsafe { *errno_location() })
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        unsafe {
            *errno_location() = self.0;
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "emscripten"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__error()
}

#[cfg(any(target_os = "openbsd", target_os = "netbsd"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__errno()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_blocked(signal: c_int) -> bool {
        unsafe {
            let mut current = MaybeUninit::<libc::sigset_t>::uninit();
            libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), current.as_mut_ptr());
            libc::sigismember(current.as_ptr(), signal) == 1
        }
    }

    #[test]
    fn test_mask_blocks_and_restores() {
        assert!(!is_blocked(SIGCHLD));
        {
            let mask = SignalMask::block_all().expect("block");
            assert!(is_blocked(SIGCHLD));
            assert!(is_blocked(SIGINT));
            assert!(is_blocked(SIGTSTP));
            assert_eq!(unsafe { libc::sigismember(mask.previous(), SIGCHLD) }, 0);
        }
        assert!(!is_blocked(SIGCHLD));
    }

    #[test]
    fn test_nested_masks() {
        let outer = SignalMask::block_all().expect("block");
        {
            let _inner = SignalMask::block_all().expect("block");
            assert!(is_blocked(SIGINT));
        }
        // Inner guard restores the outer mask, not the unblocked one.
        assert!(is_blocked(SIGINT));
        drop(outer);
        assert!(!is_blocked(SIGINT));
    }
}
