//! Session log channel port.
//!
//! This is the user-facing log of the active bridge run, separate from the
//! `tracing` diagnostics of the supervisor itself. Hosts typically render it
//! as an output panel that can be brought to front with [`LogChannelPort::reveal`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

/// Append-only log for the active run.
///
/// Implementations should be thread-safe and non-blocking.
pub trait LogChannelPort: Send + Sync {
    /// Append a leveled supervisor message.
    fn log(&self, level: LogLevel, message: &str);

    /// Append one raw line of bridge output.
    fn write_line(&self, line: &str);

    /// Bring the log in front of the user.
    fn reveal(&self);

    /// Drop everything logged so far.
    fn clear(&self);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}
