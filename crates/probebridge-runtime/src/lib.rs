//! Process runtime for the debug bridge supervisor.
//!
//! This crate provides the OS-facing half of probebridge: free-port
//! allocation, the readiness gate, process spawning and signalling, the
//! supervisor dispatch task, and the default adapters for the core ports
//! (layered settings store, directory workspace, in-memory session log).

#![deny(unused_crate_dependencies)]

pub mod executable;
pub mod gate;
pub mod ports;
pub mod process;
pub mod session_log;
pub mod settings_store;
pub mod supervisor;
pub mod workspace;

pub use executable::{EXECUTABLE_ENV, resolve_bridge_executable};
pub use gate::{GateTimings, ReadinessGate, ReadinessWaiter};
pub use ports::{PortReservation, allocate_free_port, is_port_available};
pub use process::{ExitKind, ExitOutcome, OsSignals, ProcessSignals, SignalError};
pub use session_log::{SessionLog, SessionLogEntry, SessionLogEvent};
pub use settings_store::{LayeredSettingsStore, default_settings_path};
pub use supervisor::{BridgeSupervisor, SupervisorDeps, SupervisorOptions};
pub use workspace::{DirectoryWorkspace, write_if_changed};
