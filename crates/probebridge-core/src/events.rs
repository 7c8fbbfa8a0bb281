//! Supervisor lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one supervised bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl SupervisorState {
    /// Whether a process handle exists in this state.
    pub const fn has_process(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Point-in-time view published by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupervisorSnapshot {
    pub state: SupervisorState,
    /// Port of the live process; `None` when nothing is running.
    pub port: Option<u16>,
    /// Pid of the live process.
    pub pid: Option<u32>,
}

impl SupervisorSnapshot {
    pub const STOPPED: Self = Self {
        state: SupervisorState::Stopped,
        port: None,
        pid: None,
    };
}
