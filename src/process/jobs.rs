use std::sync::atomic::{AtomicI32, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::signal::SignalMask;
use super::ProcessError;
use crate::core::state::ExitOutcome;

// Slot lifecycle. Each transition has a single owner:
//   main loop:      FREE -> RESERVED -> RUNNING, FINISHED -> FREE
//   SIGCHLD reaper: RUNNING -> FINISHED
const FREE: u8 = 0;
const RESERVED: u8 = 1;
const RUNNING: u8 = 2;
const FINISHED: u8 = 3;

pub const DEFAULT_MAX_JOBS: usize = 1024;

struct Slot {
    state: AtomicU8,
    pid: AtomicI32,
    status: AtomicI32,
    started: AtomicU64,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(FREE),
            pid: AtomicI32::new(0),
            status: AtomicI32::new(0),
            started: AtomicU64::new(0),
        }
    }
}

/// A background process the shell is still tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub pid: libc::pid_t,
    pub started: Instant,
}

/// A background process the reaper has collected but the main loop has
/// not reported yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedJob {
    pub pid: libc::pid_t,
    pub outcome: ExitOutcome,
    pub runtime: Duration,
}

/// Fixed arena of background job slots.
///
/// Allocated once at startup so the SIGCHLD handler can scan and update it
/// without allocating or taking locks.
pub struct JobTable {
    slots: Box<[Slot]>,
    count: AtomicUsize,
    cursor: AtomicUsize,
    epoch: Instant,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| Slot::new()).collect(),
            count: AtomicUsize::new(0),
            cursor: AtomicUsize::new(0),
            epoch: Instant::now(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of jobs still running.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_capacity(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.state.load(Ordering::Acquire) == FREE)
    }

    /// Starts tracking `pid`. Callers block signals around fork and insert
    /// so the reaper can never see the child before its slot exists.
    pub fn insert(&self, pid: libc::pid_t) -> Result<(), ProcessError> {
        let len = self.slots.len();
        let start = self.cursor.load(Ordering::Relaxed) % len;

        for offset in 0..len {
            let index = (start + offset) % len;
            let slot = &self.slots[index];
            if slot
                .state
                .compare_exchange(FREE, RESERVED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }

            slot.pid.store(pid, Ordering::Relaxed);
            slot.status.store(0, Ordering::Relaxed);
            slot.started.store(self.now_nanos(), Ordering::Relaxed);
            slot.state.store(RUNNING, Ordering::Release);
            self.count.fetch_add(1, Ordering::SeqCst);
            self.cursor.store(index + 1, Ordering::Relaxed);
            log::debug!("tracking background job {} in slot {}", pid, index);
            return Ok(());
        }

        Err(ProcessError::TooManyJobs(len))
    }

    /// Marks the running job `pid` as finished with the raw wait status.
    /// Returns false when no running job has that pid, so a repeated
    /// removal is a no-op. Async-signal-safe.
    pub fn remove_by_pid(&self, pid: libc::pid_t, status: libc::c_int) -> bool {
        for slot in self.slots.iter() {
            if slot.state.load(Ordering::Acquire) != RUNNING
                || slot.pid.load(Ordering::Relaxed) != pid
            {
                continue;
            }

            slot.status.store(status, Ordering::Relaxed);
            if slot
                .state
                .compare_exchange(RUNNING, FINISHED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.count.fetch_sub(1, Ordering::SeqCst);
                return true;
            }
        }
        false
    }

    /// Collects every tracked child that has terminated, without blocking.
    /// This is the SIGCHLD handler body: no allocation, no output.
    pub fn reap_finished(&self) -> usize {
        let mut reaped = 0;
        for slot in self.slots.iter() {
            if slot.state.load(Ordering::Acquire) != RUNNING {
                continue;
            }

            let pid = slot.pid.load(Ordering::Relaxed);
            let mut status: libc::c_int = 0;
            let ret = unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) };
            if ret == pid && self.remove_by_pid(pid, status) {
                reaped += 1;
            }
        }
        reaped
    }

    /// Hands every finished job to the caller exactly once and frees its slot.
    pub fn drain_finished(&self) -> Vec<FinishedJob> {
        let now = self.now_nanos();
        let mut finished = Vec::new();

        for slot in self.slots.iter() {
            if slot.state.load(Ordering::Acquire) != FINISHED {
                continue;
            }

            let pid = slot.pid.load(Ordering::Relaxed);
            let status = slot.status.load(Ordering::Relaxed);
            let started = slot.started.load(Ordering::Relaxed);
            slot.state.store(FREE, Ordering::Release);

            finished.push(FinishedJob {
                pid,
                outcome: ExitOutcome::from_wait_status(status),
                runtime: Duration::from_nanos(now.saturating_sub(started)),
            });
        }
        finished
    }

    pub fn running(&self) -> Vec<Job> {
        self.slots
            .iter()
            .filter(|slot| slot.state.load(Ordering::Acquire) == RUNNING)
            .map(|slot| Job {
                pid: slot.pid.load(Ordering::Relaxed),
                started: self.epoch
                    + Duration::from_nanos(slot.started.load(Ordering::Relaxed)),
            })
            .collect()
    }

    /// Sends SIGTERM to every running job, waits for each one and empties
    /// the table. Returns how many jobs were terminated.
    pub fn terminate_all(&self) -> Result<usize, ProcessError> {
        let _mask = SignalMask::block_all()?;
        let mut terminated = 0;

        for slot in self.slots.iter() {
            if slot.state.load(Ordering::Acquire) == RUNNING {
                let pid = slot.pid.load(Ordering::Relaxed);
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
                wait_blocking(pid);
                log::debug!("terminated background job {}", pid);
                terminated += 1;
            }

            if slot.state.swap(FREE, Ordering::AcqRel) == RUNNING {
                self.count.fetch_sub(1, Ordering::SeqCst);
            }
        }

        Ok(terminated)
    }

    fn now_nanos(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Waits for `pid`, retrying on EINTR. ECHILD means someone else already
/// collected it.
fn wait_blocking(pid: libc::pid_t) {
    let mut status: libc::c_int = 0;
    loop {
        let ret = unsafe { libc::waitpid(pid, &mut status, 0) };
        if ret == pid
            || std::io::Error::last_os_error().raw_os_error() != Some(libc::EINTR)
        {
            return;
        }
    }
}
