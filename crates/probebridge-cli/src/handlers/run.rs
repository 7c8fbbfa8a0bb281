//! Run command handler.
//!
//! Starts the bridge, reports the port once it is ready and supervises it
//! until Ctrl-C or until the bridge stops on its own. The session log is
//! printed to stderr once the supervisor reveals it, and live from then on;
//! with `--verbose` it is printed live from the start.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use probebridge_core::{
    BridgeSettingsPort, PortSetting, SettingsScope, SettingsUpdate, SupervisorState, TransportKind,
};
use probebridge_runtime::{BridgeSupervisor, SessionLog, SessionLogEvent, resolve_bridge_executable};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::settings::extra_args_update;

/// An automatic restart passes through `Stopped` on its way back to
/// `Starting`; only a state that holds this long counts as stopped.
const STOPPED_SETTLE: Duration = Duration::from_millis(500);

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub executable: Option<PathBuf>,
    pub transport: Option<TransportKind>,
    pub port: Option<u16>,
    pub extra_args: Option<String>,
}

impl RunArgs {
    /// Per-invocation overrides, applied to the session scope only.
    fn session_overrides(&self) -> SettingsUpdate {
        let mut update = self
            .extra_args
            .as_deref()
            .map(extra_args_update)
            .unwrap_or_default();
        update.transport = self.transport;
        update.port = self.port.map(PortSetting::from);
        update
    }
}

/// Execute the run command.
pub async fn execute(ctx: &CliContext, args: RunArgs) -> Result<()> {
    let overrides = args.session_overrides();
    if !overrides.is_empty() {
        ctx.settings
            .update(SettingsScope::Session, overrides)
            .await
            .map_err(CliError::from)?;
    }

    let executable =
        resolve_bridge_executable(args.executable.as_deref()).map_err(CliError::from)?;
    info!(executable = %executable.display(), "Using debug bridge executable");

    let printer = spawn_log_printer(ctx.log.clone(), ctx.verbose);
    let supervisor = ctx.supervisor(executable);

    let outcome = supervise(&supervisor).await;

    supervisor.shutdown().await;
    // Give the printer a chance to flush the final entries.
    tokio::time::sleep(Duration::from_millis(50)).await;
    printer.abort();
    outcome
}

async fn supervise(supervisor: &BridgeSupervisor) -> Result<()> {
    supervisor.start().await.map_err(CliError::from)?;

    let port = supervisor.current_port().unwrap_or_default();
    println!("OpenOCD ready on port {port}");
    println!("Press Ctrl+C to stop");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            println!("Stopping...");
            supervisor.stop().await.map_err(CliError::from)?;
            Ok(())
        }
        () = wait_until_stopped(supervisor) => {
            Err(CliError::Bridge("debug bridge stopped".to_string()).into())
        }
    }
}

async fn wait_until_stopped(supervisor: &BridgeSupervisor) {
    let mut states = supervisor.subscribe();
    loop {
        if states
            .wait_for(|snapshot| snapshot.state == SupervisorState::Stopped)
            .await
            .is_err()
        {
            return;
        }
        tokio::time::sleep(STOPPED_SETTLE).await;
        if states.borrow_and_update().state == SupervisorState::Stopped {
            return;
        }
    }
}

// ── Session log printing ────────────────────────────────────────────

/// Decides which session log lines reach the terminal.
#[derive(Debug, Default)]
struct LogPrinter {
    revealed: bool,
    backlog: Vec<String>,
}

impl LogPrinter {
    fn new(live: bool) -> Self {
        Self {
            revealed: live,
            backlog: Vec::new(),
        }
    }

    /// Lines to print in response to `event`.
    fn handle(&mut self, event: SessionLogEvent) -> Vec<String> {
        match event {
            SessionLogEvent::Entry(entry) if self.revealed => vec![entry.render()],
            SessionLogEvent::Entry(entry) => {
                self.backlog.push(entry.render());
                Vec::new()
            }
            SessionLogEvent::Reveal if !self.revealed => {
                self.revealed = true;
                std::mem::take(&mut self.backlog)
            }
            SessionLogEvent::Reveal => Vec::new(),
            SessionLogEvent::Cleared => {
                self.backlog.clear();
                Vec::new()
            }
        }
    }
}

fn spawn_log_printer(log: Arc<SessionLog>, live: bool) -> JoinHandle<()> {
    let mut events = log.subscribe();
    tokio::spawn(async move {
        let mut printer = LogPrinter::new(live);
        loop {
            match events.recv().await {
                Ok(event) => {
                    for line in printer.handle(event) {
                        eprintln!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = %skipped, "Session log printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
