//! The supervisor's single dispatch task.
//!
//! All supervisor state lives here and is only touched while handling one
//! mailbox message at a time. Reader, exit-watcher and timer tasks never
//! mutate state; they post messages tagged with the generation of the process
//! they belong to.

use std::path::Path;
use std::time::Duration;

use probebridge_core::{
    BridgeConfig, BridgeError, BridgeSettings, OutputEvent, PortSetting, Severity,
    SettingsScope, SettingsUpdate, SupervisorSnapshot, SupervisorState, validate_settings,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::commands::Message;
use super::{SupervisorDeps, SupervisorOptions};
use crate::gate::{ReadinessGate, ReadinessWaiter};
use crate::ports::allocate_free_port;
use crate::process::{BridgeProcess, ExitKind, ExitOutcome, SignalError, SpawnRequest, StreamKind};
use crate::workspace::write_if_changed;

/// Prefix for echoed bridge output in the session log.
const OUTPUT_PREFIX: &str = "[ OCD] ";

struct LiveProcess {
    process: BridgeProcess,
    port: u16,
    generation: u64,
    timers: JoinHandle<()>,
}

pub(crate) struct Actor {
    deps: SupervisorDeps,
    options: SupervisorOptions,
    mailbox: mpsc::UnboundedSender<Message>,
    snapshot: watch::Sender<SupervisorSnapshot>,
    state: SupervisorState,
    generation: u64,
    live: Option<LiveProcess>,
    gate: Option<ReadinessGate>,
}

impl Actor {
    pub(crate) const fn new(
        deps: SupervisorDeps,
        options: SupervisorOptions,
        mailbox: mpsc::UnboundedSender<Message>,
        snapshot: watch::Sender<SupervisorSnapshot>,
    ) -> Self {
        Self {
            deps,
            options,
            mailbox,
            snapshot,
            state: SupervisorState::Stopped,
            generation: 0,
            live: None,
            gate: None,
        }
    }

    pub(crate) async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = inbox.recv().await {
            trace!(message = message.name(), state = %self.state, "Supervisor message");
            match message {
                Message::Start { restart, reply } => {
                    let result = self.start(restart).await;
                    let _ = reply.send(result);
                }
                Message::Stop { reply } => {
                    self.stop(true).await;
                    let _ = reply.send(());
                }
                Message::Restart { reply } => {
                    let result = self.restart().await;
                    let _ = reply.send(result);
                }
                Message::Shutdown { reply } => {
                    self.shutdown().await;
                    if let Some(reply) = reply {
                        let _ = reply.send(());
                    }
                    break;
                }
                Message::Output {
                    generation,
                    stream,
                    line,
                } => self.on_output(generation, stream, &line).await,
                Message::Exited {
                    generation,
                    outcome,
                } => self.on_exited(generation, outcome).await,
                Message::StillStarting { generation } => self.on_still_starting(generation),
                Message::ReadinessTimedOut { generation } => {
                    self.on_readiness_timeout(generation).await;
                }
            }
        }
        debug!("Supervisor task exiting");
    }

    // ── Requests ───────────────────────────────────────────────────

    async fn start(&mut self, restart: bool) -> Result<ReadinessWaiter, BridgeError> {
        if self.live.is_some() {
            warn!(state = %self.state, "Debug bridge already started, ignoring start");
            self.deps.log.warn("openocd is already started");
            let gate = self
                .gate
                .get_or_insert_with(|| ReadinessGate::settled(Ok(())));
            return Ok(gate.waiter());
        }

        if !restart {
            self.deps.log.clear();
        }
        self.deps.log.info("start openocd server");

        let gate = ReadinessGate::new();
        self.gate = Some(gate.clone());
        self.set_state(SupervisorState::Starting);

        if let Err(err) = self.launch(&gate).await {
            error!(error = %err, "Failed to start debug bridge");
            self.deps.log.error(&err.to_string());
            self.deps.log.reveal();
            self.deps.notifier.notify(Severity::Error, &err.to_string());
            gate.complete(Err(err));
            self.set_state(SupervisorState::Stopped);
        }
        Ok(gate.waiter())
    }

    async fn restart(&mut self) -> Result<ReadinessWaiter, BridgeError> {
        if self.state != SupervisorState::Running {
            return Err(BridgeError::NotRunning);
        }
        info!("Restarting debug bridge");
        self.deps.log.info("restart openocd server");
        self.stop(false).await;
        self.start(true).await
    }

    /// Interrupt the bridge, escalating to a forced kill after the grace period.
    async fn stop(&mut self, reveal_abnormal: bool) {
        let Some(pid) = self.live_pid() else {
            debug!("Stop requested with no running bridge");
            self.deps.log.warn("openocd is not started");
            return;
        };

        info!(pid = %pid, "Stopping debug bridge");
        self.deps.log.info("stop openocd server.");
        self.set_state(SupervisorState::Stopping);

        if let Some(gate) = &self.gate {
            if gate.is_pending() {
                self.deps
                    .log
                    .warn(&BridgeError::StoppedByUser.to_string());
                gate.complete(Err(BridgeError::StoppedByUser));
            }
        }
        self.deps.debug_session.stop_session().await;

        let interrupted = match self.deps.signals.interrupt(pid) {
            Ok(()) | Err(SignalError::NoSuchProcess(_)) => true,
            Err(e) => {
                warn!(pid = %pid, error = %e, "Cannot interrupt debug bridge");
                self.deps.log.warn(&format!("cannot interrupt openocd ({e}), kill now."));
                false
            }
        };

        let mut outcome = None;
        if interrupted {
            outcome = self.wait_live_exit(self.options.stop_grace).await;
            if outcome.is_none() {
                let secs = self.options.stop_grace.as_secs();
                warn!(pid = %pid, secs = %secs, "Debug bridge ignored interrupt");
                self.deps.log.warn(&format!("not stop after {secs}s, kill now."));
            }
        }
        if outcome.is_none() {
            self.force_kill(pid);
            outcome = self.wait_live_exit(self.options.kill_wait).await;
        }

        self.finish(outcome, reveal_abnormal);
    }

    async fn shutdown(&mut self) {
        if let Some(gate) = &self.gate {
            gate.complete(Err(BridgeError::SupervisorGone));
        }
        if let Some(pid) = self.live_pid() {
            info!(pid = %pid, "Supervisor shutting down, killing debug bridge");
            self.force_kill(pid);
            let outcome = self.wait_live_exit(self.options.kill_wait).await;
            self.finish(outcome, false);
        }
    }

    // ── Launch ─────────────────────────────────────────────────────

    async fn launch(&mut self, gate: &ReadinessGate) -> Result<(), BridgeError> {
        let settings = self.deps.settings.load().await?;
        validate_settings(&settings)?;
        let port = self.resolve_port(&settings).await?;

        let text = BridgeConfig::from_settings(&settings, port)?.render()?;
        let config_path = self.deps.workspace.config_file_path()?;
        write_if_changed(&config_path, &text).await?;

        let request = SpawnRequest {
            program: self.options.executable.clone(),
            args: bridge_args(&config_path, &settings),
            cwd: self.deps.workspace.working_dir()?,
        };
        self.deps.log.info(&format!(" + {request}"));

        self.generation += 1;
        let generation = self.generation;

        let lines = self.mailbox.clone();
        let exits = self.mailbox.clone();
        let process = BridgeProcess::spawn(
            &request,
            move |stream, line| {
                let _ = lines.send(Message::Output {
                    generation,
                    stream,
                    line,
                });
            },
            move |outcome| {
                let _ = exits.send(Message::Exited {
                    generation,
                    outcome,
                });
            },
        )
        .map_err(|e| BridgeError::Spawn(format!("{}: {e}", request.program.display())))?;

        let slow = self.mailbox.clone();
        let late = self.mailbox.clone();
        let timers = gate.arm(
            self.options.timings,
            move || {
                let _ = slow.send(Message::StillStarting { generation });
            },
            move || {
                let _ = late.send(Message::ReadinessTimedOut { generation });
            },
        );

        info!(
            pid = %process.pid(),
            port = %port,
            generation = %generation,
            "Debug bridge starting"
        );
        self.live = Some(LiveProcess {
            process,
            port,
            generation,
            timers,
        });
        self.set_state(SupervisorState::Starting);
        Ok(())
    }

    async fn resolve_port(&self, settings: &BridgeSettings) -> Result<u16, BridgeError> {
        if let PortSetting::Fixed(port) = settings.port {
            return Ok(port);
        }

        let port = allocate_free_port().map_err(|e| BridgeError::PortAllocation(e.to_string()))?;
        info!(port = %port, "Resolved automatic port");
        self.deps.log.info(&format!("using free port {port}"));
        self.deps
            .settings
            .update(
                SettingsScope::Session,
                SettingsUpdate::port(PortSetting::Fixed(port)),
            )
            .await?;
        Ok(port)
    }

    // ── Process events ─────────────────────────────────────────────

    async fn on_output(&mut self, generation: u64, stream: StreamKind, line: &str) {
        if !self.is_live(generation) {
            trace!(generation = %generation, "Dropping output from a discarded process");
            return;
        }
        self.deps.log.write_line(&format!("{OUTPUT_PREFIX}{line}"));

        let event = self.options.classifier.classify(line);
        if event == OutputEvent::Informational {
            return;
        }
        debug!(?event, %stream, state = %self.state, "Classified bridge output");

        match (self.state, event) {
            (SupervisorState::Starting, OutputEvent::Ready) => self.on_ready(),
            (SupervisorState::Starting, fault) => self.fail_start(fault).await,
            (SupervisorState::Running, OutputEvent::Ready) => {
                debug!("Bridge reported ready again");
            }
            (SupervisorState::Running, OutputEvent::StuckSignal) => {
                self.write_fault(event);
                if let Err(e) = self.restart().await {
                    warn!(error = %e, "Automatic restart failed");
                }
            }
            (SupervisorState::Running, OutputEvent::PortBusy) => {
                self.write_fault(event);
                self.reset_port().await;
                self.stop(true).await;
            }
            (SupervisorState::Running, fault) => {
                self.write_fault(fault);
                self.stop(true).await;
            }
            (SupervisorState::Stopped | SupervisorState::Stopping, _) => {}
        }
    }

    fn on_ready(&mut self) {
        let Some(gate) = &self.gate else { return };
        if !gate.complete(Ok(())) {
            return;
        }
        let port = self.live.as_ref().map(|live| live.port).unwrap_or_default();
        info!(port = %port, "Debug bridge ready");
        self.deps.log.info(&format!("openocd is ready on port {port}"));
        self.set_state(SupervisorState::Running);
        self.deps
            .notifier
            .notify(Severity::Info, &format!("OpenOCD listening on port {port}"));
    }

    /// A fault before readiness ends the attempt immediately.
    async fn fail_start(&mut self, fault: OutputEvent) {
        self.write_fault(fault);
        let port = self.live.as_ref().map(|live| live.port).unwrap_or_default();

        let err = if fault == OutputEvent::PortBusy {
            self.reset_port().await;
            BridgeError::PortBusy { port }
        } else {
            BridgeError::HardwareFault(fault.summary().unwrap_or("debug bridge fault").to_string())
        };
        warn!(?fault, error = %err, "Debug bridge failed while starting");
        if let Some(gate) = &self.gate {
            gate.complete(Err(err));
        }
        self.kill_now().await;
    }

    async fn on_exited(&mut self, generation: u64, outcome: ExitOutcome) {
        if !self.is_live(generation) {
            trace!(generation = %generation, "Ignoring exit of a discarded process");
            return;
        }
        warn!(outcome = %outcome, state = %self.state, "Debug bridge exited on its own");

        if let Some(gate) = &self.gate {
            let err = BridgeError::EarlyExit(outcome.to_string());
            if gate.is_pending() {
                self.deps.log.error(&err.to_string());
                gate.complete(Err(err));
            }
        }
        self.deps.debug_session.stop_session().await;
        self.finish(Some(outcome), true);
    }

    fn on_still_starting(&self, generation: u64) {
        if !self.is_live(generation) || self.state != SupervisorState::Starting {
            return;
        }
        warn!("Debug bridge is slow to start");
        self.deps.log.warn("Still starting, too slow");
        self.deps.log.reveal();
    }

    async fn on_readiness_timeout(&mut self, generation: u64) {
        if !self.is_live(generation) {
            return;
        }
        let secs = self.options.timings.deadline.as_secs();
        error!(secs = %secs, "Debug bridge did not become ready");
        self.deps
            .log
            .error(&BridgeError::ReadinessTimeout { secs }.to_string());
        self.deps.log.reveal();
        self.kill_now().await;
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn write_fault(&self, event: OutputEvent) {
        for hint in event.hints() {
            self.deps.log.warn(hint);
        }
        if let Some(summary) = event.summary() {
            self.deps.log.error(summary);
            self.deps.notifier.notify(Severity::Error, summary);
        }
    }

    async fn reset_port(&self) {
        warn!("Remote port busy, switching to automatic port");
        for scope in [SettingsScope::Session, SettingsScope::Persisted] {
            let update = SettingsUpdate::port(PortSetting::Auto);
            if let Err(e) = self.deps.settings.update(scope, update).await {
                warn!(?scope, error = %e, "Failed to reset port setting");
                self.deps.log.error(&format!("failed to reset port setting: {e}"));
            }
        }
    }

    /// Kill without grace. Used when the attempt has already failed.
    async fn kill_now(&mut self) {
        let Some(pid) = self.live_pid() else { return };
        self.set_state(SupervisorState::Stopping);
        self.force_kill(pid);
        self.deps.debug_session.stop_session().await;
        let outcome = self.wait_live_exit(self.options.kill_wait).await;
        self.finish(outcome, true);
    }

    fn force_kill(&self, pid: u32) {
        match self.deps.signals.force_kill(pid) {
            Ok(()) | Err(SignalError::NoSuchProcess(_)) => {}
            Err(e) => {
                error!(pid = %pid, error = %e, "Failed to kill debug bridge");
                self.deps.log.error(&format!("failed to kill openocd: {e}"));
            }
        }
    }

    async fn wait_live_exit(&mut self, limit: Duration) -> Option<ExitOutcome> {
        match self.live.as_mut() {
            Some(live) => live.process.wait_exit(limit).await,
            None => None,
        }
    }

    /// Discard the live process and report how it ended.
    fn finish(&mut self, outcome: Option<ExitOutcome>, reveal_abnormal: bool) {
        let Some(live) = self.live.take() else { return };
        live.timers.abort();

        match outcome {
            Some(outcome) => self.report_exit(outcome, reveal_abnormal),
            None => {
                error!(pid = %live.process.pid(), "Debug bridge did not exit after kill");
                self.deps.log.error("openocd did not exit after kill");
                self.deps.log.reveal();
            }
        }
        self.set_state(SupervisorState::Stopped);
    }

    fn report_exit(&self, outcome: ExitOutcome, reveal_abnormal: bool) {
        match outcome.kind() {
            ExitKind::Clean => self.deps.log.info("openocd successful finished"),
            ExitKind::Interrupted => self.deps.log.info("openocd stopped"),
            ExitKind::Abnormal => {
                self.deps.log.error(&format!("openocd exited with {outcome}"));
                if reveal_abnormal {
                    self.deps.log.reveal();
                }
            }
        }
    }

    fn is_live(&self, generation: u64) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.generation == generation)
    }

    fn live_pid(&self) -> Option<u32> {
        self.live.as_ref().map(|live| live.process.pid())
    }

    fn set_state(&mut self, state: SupervisorState) {
        self.state = state;
        let (port, pid) = self
            .live
            .as_ref()
            .map_or((None, None), |live| (Some(live.port), Some(live.process.pid())));
        self.snapshot
            .send_replace(SupervisorSnapshot { state, port, pid });
    }
}

/// `-f <config> [extra args...]`
fn bridge_args(config_path: &Path, settings: &BridgeSettings) -> Vec<String> {
    let mut args = vec!["-f".to_string(), config_path.display().to_string()];
    args.extend(settings.extra_args_list());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_put_config_first() {
        let settings = BridgeSettings {
            extra_args: Some("-d2  -c \"adapter speed 100\"".to_string()),
            ..BridgeSettings::default()
        };
        let args = bridge_args(Path::new("/w/.probebridge/openocd.cfg"), &settings);
        assert_eq!(
            args,
            vec![
                "-f",
                "/w/.probebridge/openocd.cfg",
                "-d2",
                "-c",
                "\"adapter",
                "speed",
                "100\"",
            ]
        );
    }
}
