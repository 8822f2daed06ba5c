use std::ffi::CString;
use std::io;

use super::ProcessError;

const DEV_NULL: &str = "/dev/null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Rebinds stdin or stdout of a forked child to a file.
///
/// Everything the child needs, including the failure message, is prepared
/// up front so `apply` never allocates after fork.
#[derive(Debug)]
pub struct Redirect {
    path: CString,
    direction: Direction,
    failure: Vec<u8>,
}

impl Redirect {
    pub fn new(path: &str, direction: Direction) -> Result<Self, ProcessError> {
        let c_path =
            CString::new(path).map_err(|_| ProcessError::InvalidArgument(path.to_string()))?;

        Ok(Self {
            path: c_path,
            direction,
            failure: format!("{}: No such file or directory\n", path).into_bytes(),
        })
    }

    pub fn input(path: &str) -> Result<Self, ProcessError> {
        Self::new(path, Direction::Input)
    }

    pub fn output(path: &str) -> Result<Self, ProcessError> {
        Self::new(path, Direction::Output)
    }

    /// Background jobs without `<` read from /dev/null instead of the terminal.
    pub fn null_input() -> Result<Self, ProcessError> {
        Self::input(DEV_NULL)
    }

    /// Opens the file and dups it onto the target descriptor.
    pub fn apply(&self) -> io::Result<()> {
        let (flags, target) = match self.direction {
            Direction::Input => (libc::O_RDONLY, libc::STDIN_FILENO),
            Direction::Output => (
                libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
                libc::STDOUT_FILENO,
            ),
        };

        let fd = unsafe { libc::open(self.path.as_ptr(), flags, 0o644 as libc::c_uint) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        if fd != target {
            let rc = unsafe { libc::dup2(fd, target) };
            let err = io::Error::last_os_error();
            unsafe {
                libc::close(fd);
            }
            if rc == -1 {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Writes the "no such file" message to stdout with a raw write(2).
    pub fn report_failure(&self) {
        unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                self.failure.as_ptr().cast(),
                self.failure.len(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_failure_message() {
        let redirect = Redirect::input("missing.txt").expect("redirect");
        assert_eq!(redirect.failure, b"missing.txt: No such file or directory\n");
        assert_eq!(redirect.direction, Direction::Input);
    }

    #[test]
    fn test_rejects_interior_nul() {
        assert!(matches!(
            Redirect::output("bad\0name"),
            Err(ProcessError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_null_input() {
        let redirect = Redirect::null_input().expect("redirect");
        assert_eq!(redirect.path.to_str().expect("utf8"), DEV_NULL);
        assert_eq!(redirect.direction, Direction::Input);
    }

    #[test]
    fn test_missing_input_fails_in_child() {
        let path = env::temp_dir().join(format!("smallsh-missing-{}", std::process::id()));
        let redirect = Redirect::input(path.to_str().expect("utf8")).expect("redirect");

        let pid = unsafe { libc::fork() };
        assert!(pid >= 0, "fork failed");
        if pid == 0 {
            let code = if redirect.apply().is_err() { 1 } else { 0 };
            unsafe { libc::_exit(code) };
        }

        let mut status = 0;
        unsafe { libc::waitpid(pid, &mut status, 0) };
        assert!(libc::WIFEXITED(status));
        assert_eq!(libc::WEXITSTATUS(status), 1);
    }
}
