use std::fmt;

pub mod executor;
pub mod jobs;
pub mod redirect;
pub mod signal;

pub use executor::ProcessExecutor;

#[derive(Debug)]
pub enum ProcessError {
    ForkFailed(std::io::Error),
    WaitFailed(std::io::Error),
    SameFileRedirect(String),
    InvalidArgument(String),
    TooManyJobs(usize),
    SignalError(String),
    AlreadyInstalled,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::ForkFailed(e) => write!(f, "fork failed: {}", e),
            ProcessError::WaitFailed(e) => write!(f, "wait failed: {}", e),
            ProcessError::SameFileRedirect(path) => write!(f, "Same file error: {}", path),
            ProcessError::InvalidArgument(arg) => write!(f, "invalid argument: {:?}", arg),
            ProcessError::TooManyJobs(max) => {
                write!(f, "too many background jobs (max {})", max)
            }
            ProcessError::SignalError(msg) => write!(f, "Signal error: {}", msg),
            ProcessError::AlreadyInstalled => write!(f, "signal handlers already installed"),
        }
    }
}

impl std::error::Error for ProcessError {}
