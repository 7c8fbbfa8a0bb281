//! Shared fixture for supervisor tests.
//!
//! A fake bridge is a `/bin/sh` script written into a temporary workspace.
//! The supervisor runs it as `<script> -f <config> ...`; the scripts ignore
//! their arguments and print OpenOCD-style lines.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use probebridge_core::{
    BridgeSettings, DebugSessionPort, PortSetting, SupervisorSnapshot, TransportKind,
};
use probebridge_runtime::{
    BridgeSupervisor, DirectoryWorkspace, GateTimings, LayeredSettingsStore, SessionLog,
    SupervisorDeps, SupervisorOptions,
};
use tempfile::TempDir;
use tokio::sync::watch;

pub const READY_LINE: &str = "Ready for Remote Connections";

// ── Mock backends ───────────────────────────────────────────────────

/// Counts how often the debug session was asked to stop.
#[derive(Default)]
pub struct RecordingDebugSession {
    stops: AtomicUsize,
}

impl RecordingDebugSession {
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DebugSessionPort for RecordingDebugSession {
    async fn stop_session(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Fixture ─────────────────────────────────────────────────────────

pub struct Fixture {
    pub dir: TempDir,
    pub settings: Arc<LayeredSettingsStore>,
    pub log: Arc<SessionLog>,
    pub debug_session: Arc<RecordingDebugSession>,
    pub supervisor: BridgeSupervisor,
}

pub struct FixtureBuilder {
    script: String,
    settings: BridgeSettings,
    timings: GateTimings,
    executable: Option<PathBuf>,
}

impl FixtureBuilder {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            settings: BridgeSettings {
                transport: TransportKind::Custom,
                custom_config: Some("interface dummy\ngdb_port {port}\n".to_string()),
                ..BridgeSettings::default()
            },
            timings: GateTimings::default(),
            executable: None,
        }
    }

    pub fn settings(mut self, settings: BridgeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn port(mut self, port: PortSetting) -> Self {
        self.settings.port = port;
        self
    }

    pub fn timings(mut self, still_starting: Duration, deadline: Duration) -> Self {
        self.timings = GateTimings {
            still_starting,
            deadline,
        };
        self
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn build(self) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "fake-openocd", &self.script);

        let settings = Arc::new(LayeredSettingsStore::in_memory(self.settings));
        let log = Arc::new(SessionLog::new());
        let debug_session = Arc::new(RecordingDebugSession::default());

        let deps = SupervisorDeps::new(
            settings.clone(),
            Arc::new(DirectoryWorkspace::new(dir.path())),
            log.clone(),
        )
        .with_debug_session(debug_session.clone());

        let mut options = SupervisorOptions::new(self.executable.unwrap_or(script));
        options.timings = self.timings;

        Fixture {
            dir,
            settings,
            log,
            debug_session,
            supervisor: BridgeSupervisor::spawn(deps, options),
        }
    }
}

impl Fixture {
    pub fn new(script: &str) -> Self {
        FixtureBuilder::new(script).build()
    }

    pub fn log_text(&self) -> String {
        self.log.lines().join("\n")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(".probebridge").join("openocd.cfg")
    }

    /// Wait until the published snapshot satisfies `pred`.
    pub async fn wait_for(&self, pred: impl FnMut(&SupervisorSnapshot) -> bool) -> SupervisorSnapshot {
        wait_snapshot(self.supervisor.subscribe(), pred).await
    }
}

pub async fn wait_snapshot(
    mut rx: watch::Receiver<SupervisorSnapshot>,
    pred: impl FnMut(&SupervisorSnapshot) -> bool,
) -> SupervisorSnapshot {
    let snapshot = tokio::time::timeout(Duration::from_secs(15), rx.wait_for(pred))
        .await
        .expect("timed out waiting for supervisor state")
        .expect("supervisor gone");
    *snapshot
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}
