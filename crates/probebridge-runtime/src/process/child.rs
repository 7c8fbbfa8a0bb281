//! Spawning the bridge and observing its exit.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::stream::{StreamKind, spawn_line_reader};

/// How long the exit watcher waits for the readers to drain after the
/// process is gone. A grandchild may keep the pipes open.
const READER_DRAIN: Duration = Duration::from_millis(500);

#[cfg(unix)]
const SIGINT: i32 = nix::libc::SIGINT;
#[cfg(not(unix))]
const SIGINT: i32 = 2;

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

/// Classification of an [`ExitOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Exit code 0.
    Clean,
    /// Terminated by the interrupt signal.
    Interrupted,
    /// Anything else, including an unknown status.
    Abnormal,
}

impl ExitOutcome {
    pub const fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub const fn signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }

    pub const fn kind(&self) -> ExitKind {
        match (self.code, self.signal) {
            (_, Some(SIGINT)) => ExitKind::Interrupted,
            (Some(0), None) => ExitKind::Clean,
            _ => ExitKind::Abnormal,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.signal, self.code) {
            (Some(signal), _) => write!(f, "signal {signal}"),
            (None, Some(code)) => write!(f, "code {code}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Program, arguments and working directory for one bridge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl fmt::Display for SpawnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A running bridge process.
///
/// The child itself is owned by a watcher task that reaps it and publishes
/// the [`ExitOutcome`]. Signals are delivered by pid.
#[derive(Debug)]
pub struct BridgeProcess {
    pid: u32,
    exit: watch::Receiver<Option<ExitOutcome>>,
}

impl BridgeProcess {
    /// Spawn the bridge with piped output.
    ///
    /// `on_line` receives every output line; `on_exit` runs once after the
    /// process has been reaped and its output drained.
    pub fn spawn<L, E>(request: &SpawnRequest, on_line: L, on_exit: E) -> io::Result<Self>
    where
        L: Fn(StreamKind, String) + Clone + Send + 'static,
        E: FnOnce(ExitOutcome) + Send + 'static,
    {
        let mut child = Command::new(&request.program)
            .args(&request.args)
            .current_dir(&request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child
            .id()
            .ok_or_else(|| io::Error::other("spawned process has no pid"))?;
        info!(pid = %pid, command = %request, "Spawned debug bridge");

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, pid, StreamKind::Stdout, on_line.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, pid, StreamKind::Stderr, on_line));
        }

        let (exit_tx, exit) = watch::channel(None);
        tokio::spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) => ExitOutcome::from_status(status),
                Err(e) => {
                    warn!(pid = %pid, error = %e, "Failed to wait for debug bridge");
                    ExitOutcome::default()
                }
            };
            debug!(pid = %pid, outcome = %outcome, "Debug bridge exited");
            exit_tx.send_replace(Some(outcome));

            let drained = tokio::time::timeout(READER_DRAIN, async {
                for reader in readers {
                    let _ = reader.await;
                }
            })
            .await;
            if drained.is_err() {
                debug!(pid = %pid, "Output still open after exit, not waiting for it");
            }
            on_exit(outcome);
        });

        Ok(Self { pid, exit })
    }

    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// The exit outcome, once the process has been reaped.
    pub fn exit_outcome(&self) -> Option<ExitOutcome> {
        *self.exit.borrow()
    }

    /// Wait for the process to be reaped, up to `limit`.
    ///
    /// Returns `None` on timeout.
    pub async fn wait_exit(&mut self, limit: Duration) -> Option<ExitOutcome> {
        let waited = tokio::time::timeout(limit, self.exit.wait_for(Option::is_some)).await;
        match waited {
            Ok(Ok(outcome)) => *outcome,
            // The watcher is gone without publishing, which only happens if
            // its task was aborted with the runtime.
            Ok(Err(_)) => Some(ExitOutcome::default()),
            Err(_) => None,
        }
    }
}
