//! CLI-specific error types and mappings.
//!
//! Maps [`BridgeError`] and [`SettingsError`] to exit codes and user-facing
//! messages.

use probebridge_core::{BridgeError, SettingsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The bridge failed to start or stopped on a fault.
    #[error("{0}")]
    Bridge(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process execution error.
    #[error("Process error: {0}")]
    Process(String),

    /// A required service is unavailable (probe missing, port taken).
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Bridge(_) => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Process(_) => 71,     // EX_OSERR
            Self::Io(_) => 74,          // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<BridgeError> for CliError {
    fn from(err: BridgeError) -> Self {
        let message = err.to_string();
        match err {
            BridgeError::Config(_) | BridgeError::Settings(_) => Self::Config(message),
            BridgeError::Workspace(_) => Self::Io(message),
            BridgeError::ExecutableNotFound(_) | BridgeError::Spawn(_) => Self::Process(message),
            BridgeError::PortAllocation(_)
            | BridgeError::PortBusy { .. }
            | BridgeError::HardwareFault(_) => Self::Unavailable(message),
            BridgeError::ReadinessTimeout { .. }
            | BridgeError::EarlyExit(_)
            | BridgeError::StoppedByUser
            | BridgeError::Busy
            | BridgeError::NotRunning
            | BridgeError::SupervisorGone => Self::Bridge(message),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Io(msg) => Self::Io(msg),
            SettingsError::InvalidSpeed | SettingsError::InvalidVidPid(_) => {
                Self::Arguments(err.to_string())
            }
            SettingsError::Parse(_) => Self::Config(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_exit_codes() {
        let err = CliError::from(BridgeError::PortBusy { port: 3333 });
        assert_eq!(err.exit_code(), 69);
        assert_eq!(err.to_string(), "Unavailable: port 3333 is already in use");

        let err = CliError::from(BridgeError::ExecutableNotFound("openocd".into()));
        assert_eq!(err.exit_code(), 71);

        let err = CliError::from(BridgeError::EarlyExit("code 1".into()));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "process died: code 1");
    }

    #[test]
    fn test_settings_error_mapping() {
        assert_eq!(CliError::from(SettingsError::InvalidSpeed).exit_code(), 2);
        assert_eq!(CliError::from(SettingsError::Parse("eof".into())).exit_code(), 78);
        assert!(matches!(
            CliError::from(SettingsError::Io("denied".into())),
            CliError::Io(msg) if msg == "denied"
        ));
    }
}
