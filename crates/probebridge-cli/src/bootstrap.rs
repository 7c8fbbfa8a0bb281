//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Layered settings store backed by the user's settings file
//! - Directory workspace for the generated configuration
//! - Session log shared by the supervisor and the terminal printer
//!
//! Command handlers receive the composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use probebridge_core::{NotifierPort, Severity};
use probebridge_runtime::{
    BridgeSupervisor, DirectoryWorkspace, LayeredSettingsStore, SessionLog, SupervisorDeps,
    SupervisorOptions, default_settings_path,
};

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Project directory; the configuration lands in `.probebridge/` below it.
    pub workspace: PathBuf,
    /// Persisted settings file.
    pub settings_path: PathBuf,
    /// Echo the whole session log while running.
    pub verbose: bool,
}

impl CliConfig {
    /// Use the given paths, falling back to the current directory and the
    /// per-user settings file.
    pub fn resolve(
        workspace: Option<PathBuf>,
        settings_path: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self> {
        let workspace = match workspace {
            Some(workspace) => workspace,
            None => std::env::current_dir()?,
        };
        let settings_path = match settings_path {
            Some(path) => path,
            None => default_settings_path()?,
        };
        Ok(Self {
            workspace,
            settings_path,
            verbose,
        })
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub settings: Arc<LayeredSettingsStore>,
    pub workspace: Arc<DirectoryWorkspace>,
    pub log: Arc<SessionLog>,
    pub verbose: bool,
}

impl CliContext {
    /// Build a supervisor for `executable` on top of this context.
    pub fn supervisor(&self, executable: PathBuf) -> BridgeSupervisor {
        let deps = SupervisorDeps::new(
            self.settings.clone(),
            self.workspace.clone(),
            self.log.clone(),
        )
        .with_notifier(Arc::new(TerminalNotifier));
        BridgeSupervisor::spawn(deps, SupervisorOptions::new(executable))
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    if !config.workspace.is_dir() {
        return Err(CliError::Arguments(format!(
            "workspace {} is not a directory",
            config.workspace.display()
        ))
        .into());
    }
    tracing::debug!(
        workspace = %config.workspace.display(),
        settings = %config.settings_path.display(),
        "Bootstrapping CLI context"
    );

    Ok(CliContext {
        settings: Arc::new(LayeredSettingsStore::with_file(config.settings_path)),
        workspace: Arc::new(DirectoryWorkspace::new(config.workspace)),
        log: Arc::new(SessionLog::new()),
        verbose: config.verbose,
    })
}

/// Prints user notifications to stderr.
struct TerminalNotifier;

impl NotifierPort for TerminalNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => eprintln!("✓ {message}"),
            Severity::Warning => eprintln!("⚠️  {message}"),
            Severity::Error => eprintln!("✗ {message}"),
        }
    }
}
