//! User notification port.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Fire-and-forget user-facing messages.
///
/// Purely a convenience for interactive hosts; supervision never depends on a
/// notification being shown.
pub trait NotifierPort: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// A notifier that drops everything, for tests and headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    pub const fn new() -> Self {
        Self
    }
}

impl NotifierPort for NoopNotifier {
    fn notify(&self, _severity: Severity, _message: &str) {}
}
