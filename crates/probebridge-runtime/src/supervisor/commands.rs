//! Mailbox messages for the supervisor actor.

use probebridge_core::BridgeError;
use tokio::sync::oneshot;

use crate::gate::ReadinessWaiter;
use crate::process::{ExitOutcome, StreamKind};

pub(crate) type StartReply = oneshot::Sender<Result<ReadinessWaiter, BridgeError>>;

/// Everything the actor reacts to.
///
/// Requests come from the [`super::BridgeSupervisor`] handle. Process events
/// come from the reader, exit-watcher and gate-timer tasks and carry the
/// generation of the process that produced them, so events from a discarded
/// process are recognised and dropped.
pub(crate) enum Message {
    // ── Requests ───────────────────────────────────────────────────
    Start {
        restart: bool,
        reply: StartReply,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Restart {
        reply: StartReply,
    },
    Shutdown {
        reply: Option<oneshot::Sender<()>>,
    },

    // ── Process events ─────────────────────────────────────────────
    Output {
        generation: u64,
        stream: StreamKind,
        line: String,
    },
    Exited {
        generation: u64,
        outcome: ExitOutcome,
    },
    StillStarting {
        generation: u64,
    },
    ReadinessTimedOut {
        generation: u64,
    },
}

impl Message {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop { .. } => "stop",
            Self::Restart { .. } => "restart",
            Self::Shutdown { .. } => "shutdown",
            Self::Output { .. } => "output",
            Self::Exited { .. } => "exited",
            Self::StillStarting { .. } => "still_starting",
            Self::ReadinessTimedOut { .. } => "readiness_timed_out",
        }
    }
}
