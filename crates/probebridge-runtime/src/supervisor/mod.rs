//! Debug bridge supervisor.
//!
//! [`BridgeSupervisor`] is a cheap handle to a dispatch task that owns the
//! bridge process, its readiness gate and the lifecycle state machine:
//!
//! ```text
//! Stopped --start--> Starting --Ready--> Running
//!    ^                  |                   |
//!    |    fault / exit / timeout            | stop, disconnect, I/O or
//!    +------------------+                   | protocol fault, port busy
//!    +------------- Stopping <--------------+
//! ```
//!
//! A stuck TDO signal while running triggers a restart.
//!
//! # Overlapping requests
//!
//! `start` and `restart` are rejected with [`BridgeError::Busy`] while another
//! start or restart from this handle is still waiting for readiness. `stop` is
//! always accepted; a pending start then fails with
//! [`BridgeError::StoppedByUser`].

mod actor;
mod commands;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use probebridge_core::{
    BridgeError, BridgeSettingsPort, DebugSessionPort, LogChannelPort, NoopDebugSession,
    NoopNotifier, NotifierPort, OutputClassifier, SupervisorSnapshot, SupervisorState,
    WorkspacePort,
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::gate::GateTimings;
use crate::process::{OsSignals, ProcessSignals};
use actor::Actor;
use commands::Message;

/// Grace period between the interrupt and the forced kill.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(3);

/// How long to wait for the process to be reaped after a forced kill.
pub const DEFAULT_KILL_WAIT: Duration = Duration::from_secs(1);

/// Collaborators the supervisor talks to.
#[derive(Clone)]
pub struct SupervisorDeps {
    pub settings: Arc<dyn BridgeSettingsPort>,
    pub workspace: Arc<dyn WorkspacePort>,
    pub log: Arc<dyn LogChannelPort>,
    pub notifier: Arc<dyn NotifierPort>,
    pub debug_session: Arc<dyn DebugSessionPort>,
    pub signals: Arc<dyn ProcessSignals>,
}

impl SupervisorDeps {
    /// Required collaborators; notifications and the debug session are no-ops
    /// and signals go to the host OS.
    pub fn new(
        settings: Arc<dyn BridgeSettingsPort>,
        workspace: Arc<dyn WorkspacePort>,
        log: Arc<dyn LogChannelPort>,
    ) -> Self {
        Self {
            settings,
            workspace,
            log,
            notifier: Arc::new(NoopNotifier::new()),
            debug_session: Arc::new(NoopDebugSession),
            signals: Arc::new(OsSignals),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotifierPort>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_debug_session(mut self, debug_session: Arc<dyn DebugSessionPort>) -> Self {
        self.debug_session = debug_session;
        self
    }

    #[must_use]
    pub fn with_signals(mut self, signals: Arc<dyn ProcessSignals>) -> Self {
        self.signals = signals;
        self
    }
}

/// Tunables for one supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Bridge executable.
    pub executable: PathBuf,
    pub timings: GateTimings,
    pub stop_grace: Duration,
    pub kill_wait: Duration,
    pub classifier: OutputClassifier,
}

impl SupervisorOptions {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timings: GateTimings::default(),
            stop_grace: DEFAULT_STOP_GRACE,
            kill_wait: DEFAULT_KILL_WAIT,
            classifier: OutputClassifier::standard(),
        }
    }
}

/// Scope guard that clears the in-flight flag on drop.
///
/// This ensures the flag is always cleared, even on error paths.
struct OperationGuard<'a> {
    in_flight: &'a AtomicBool,
}

impl<'a> OperationGuard<'a> {
    fn acquire(in_flight: &'a AtomicBool) -> Option<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { in_flight })
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Handle to a running supervisor.
///
/// Dropping the handle shuts the supervisor down and kills any live bridge.
pub struct BridgeSupervisor {
    mailbox: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<SupervisorSnapshot>,
    starting: AtomicBool,
}

impl BridgeSupervisor {
    /// Spawn the dispatch task. Must be called within a Tokio runtime.
    pub fn spawn(deps: SupervisorDeps, options: SupervisorOptions) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(SupervisorSnapshot::STOPPED);
        let actor = Actor::new(deps, options, mailbox.clone(), snapshot_tx);
        tokio::spawn(actor.run(inbox));

        Self {
            mailbox,
            snapshot,
            starting: AtomicBool::new(false),
        }
    }

    /// Start the bridge and wait until it is ready.
    ///
    /// Does nothing if a bridge is already running; use [`Self::restart`] to
    /// replace it.
    pub async fn start(&self) -> Result<(), BridgeError> {
        self.start_with(false).await
    }

    /// Start, keeping the session log when `restart` is set.
    pub async fn start_with(&self, restart: bool) -> Result<(), BridgeError> {
        let _guard = OperationGuard::acquire(&self.starting).ok_or(BridgeError::Busy)?;
        let waiter = self
            .request(|reply| Message::Start { restart, reply })
            .await??;
        waiter.wait().await
    }

    /// Stop the bridge. Resolves once the process is gone.
    pub async fn stop(&self) -> Result<(), BridgeError> {
        self.request(|reply| Message::Stop { reply }).await
    }

    /// Stop a running bridge and start a new one, returning the new
    /// attempt's outcome.
    pub async fn restart(&self) -> Result<(), BridgeError> {
        let _guard = OperationGuard::acquire(&self.starting).ok_or(BridgeError::Busy)?;
        let waiter = self.request(|reply| Message::Restart { reply }).await??;
        waiter.wait().await
    }

    /// Port of the live bridge, `None` when nothing is running.
    pub fn current_port(&self) -> Option<u16> {
        self.snapshot.borrow().port
    }

    pub fn state(&self) -> SupervisorState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> SupervisorSnapshot {
        *self.snapshot.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorSnapshot> {
        self.snapshot.clone()
    }

    /// Kill any live bridge and end the dispatch task.
    pub async fn shutdown(self) {
        let (reply, done) = oneshot::channel();
        if self
            .mailbox
            .send(Message::Shutdown { reply: Some(reply) })
            .is_ok()
        {
            let _ = done.await;
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, BridgeError> {
        let (reply, response) = oneshot::channel();
        self.mailbox
            .send(build(reply))
            .map_err(|_| BridgeError::SupervisorGone)?;
        response.await.map_err(|_| BridgeError::SupervisorGone)
    }
}

impl Drop for BridgeSupervisor {
    fn drop(&mut self) {
        if self.mailbox.send(Message::Shutdown { reply: None }).is_ok() {
            debug!("Supervisor handle dropped, shutting down");
        }
    }
}
