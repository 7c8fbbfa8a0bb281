//! Error taxonomy for bridge supervision.
//!
//! [`BridgeError`] is `Clone` because one start outcome may be observed by
//! several waiters on the same readiness gate. Underlying errors are carried
//! as their rendered message for the same reason.

use thiserror::Error;

use crate::config::ConfigError;
use crate::settings::SettingsError;

/// Errors from the workspace accessor.
#[derive(Debug, Clone, Error)]
pub enum WorkspaceError {
    #[error("no workspace folder is open")]
    NoWorkspace,

    #[error("cannot write to {path}: {reason}")]
    NotWritable { path: String, reason: String },
}

/// Failure of a start, stop or restart request.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("failed to allocate a free port: {0}")]
    PortAllocation(String),

    #[error("debug bridge executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("failed to spawn debug bridge: {0}")]
    Spawn(String),

    #[error("Cannot start within {secs}s, please check log.")]
    ReadinessTimeout { secs: u64 },

    #[error("{0}")]
    HardwareFault(String),

    #[error("port {port} is already in use")]
    PortBusy { port: u16 },

    #[error("process died: {0}")]
    EarlyExit(String),

    #[error("OpenOCD stopped by user")]
    StoppedByUser,

    #[error("another start or restart is already in progress")]
    Busy,

    #[error("debug bridge is not running")]
    NotRunning,

    #[error("supervisor has shut down")]
    SupervisorGone,
}

impl BridgeError {
    /// Whether calling `start()` again may succeed without user action.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Spawn(_)
                | Self::EarlyExit(_)
                | Self::ReadinessTimeout { .. }
                | Self::HardwareFault(_)
                | Self::PortBusy { .. }
                | Self::PortAllocation(_)
                | Self::Busy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_matches_log_text() {
        let err = BridgeError::ReadinessTimeout { secs: 10 };
        assert_eq!(err.to_string(), "Cannot start within 10s, please check log.");
    }

    #[test]
    fn config_errors_convert() {
        let err: BridgeError = ConfigError::UnresolvedPort.into();
        assert!(matches!(err, BridgeError::Config(ConfigError::UnresolvedPort)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(BridgeError::EarlyExit("code 3".into()).is_retryable());
        assert!(BridgeError::PortBusy { port: 3333 }.is_retryable());
        assert!(!BridgeError::StoppedByUser.is_retryable());
        assert!(!BridgeError::SupervisorGone.is_retryable());
    }
}
