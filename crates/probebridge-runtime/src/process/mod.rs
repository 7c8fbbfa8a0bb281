//! Process spawning and OS signal delivery for the bridge.
//!
//! This module owns everything that touches a live OS process:
//! - `child`: spawn with piped output and publish the exit outcome
//! - `stream`: lossy line readers for stdout/stderr
//! - `signals`: interrupt and force-kill behind a small capability trait

pub mod child;
pub mod signals;
pub mod stream;

pub use child::{BridgeProcess, ExitKind, ExitOutcome, SpawnRequest};
pub use signals::{OsSignals, ProcessSignals, SignalError};
pub use stream::{StreamKind, spawn_line_reader};
