//! Signal delivery capability.
//!
//! The supervisor only ever needs two things from the OS: ask the bridge to
//! exit, and make it exit. Keeping both behind [`ProcessSignals`] stops host
//! differences in signal handling from leaking into the state machine and lets
//! tests observe or replace delivery.
//!
//! # Platform behavior
//! - Unix: `SIGINT` for interrupt, `SIGKILL` for force-kill (via nix)
//! - Windows: no interrupt; force-kill runs `taskkill /T /F`

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("process {0} no longer exists")]
    NoSuchProcess(u32),

    #[error("graceful interrupt is not supported on this platform")]
    Unsupported,

    #[error("failed to signal process {pid}: {reason}")]
    Failed { pid: u32, reason: String },
}

/// Interrupt and force-kill a process by pid.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSignals: Send + Sync {
    /// Request a graceful exit.
    fn interrupt(&self, pid: u32) -> Result<(), SignalError>;

    /// Terminate immediately.
    fn force_kill(&self, pid: u32) -> Result<(), SignalError>;
}

/// Signal delivery through the host OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignals;

#[cfg(unix)]
impl OsSignals {
    fn send(pid: u32, signal: nix::sys::signal::Signal) -> Result<(), SignalError> {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let raw = i32::try_from(pid).map_err(|_| SignalError::Failed {
            pid,
            reason: "pid out of range".to_string(),
        })?;
        match kill(Pid::from_raw(raw), signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(SignalError::NoSuchProcess(pid)),
            Err(e) => Err(SignalError::Failed {
                pid,
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(unix)]
impl ProcessSignals for OsSignals {
    fn interrupt(&self, pid: u32) -> Result<(), SignalError> {
        Self::send(pid, nix::sys::signal::Signal::SIGINT)
    }

    fn force_kill(&self, pid: u32) -> Result<(), SignalError> {
        Self::send(pid, nix::sys::signal::Signal::SIGKILL)
    }
}

#[cfg(not(unix))]
impl ProcessSignals for OsSignals {
    fn interrupt(&self, _pid: u32) -> Result<(), SignalError> {
        Err(SignalError::Unsupported)
    }

    fn force_kill(&self, pid: u32) -> Result<(), SignalError> {
        let status = std::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .status()
            .map_err(|e| SignalError::Failed {
                pid,
                reason: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(SignalError::NoSuchProcess(pid))
        }
    }
}
