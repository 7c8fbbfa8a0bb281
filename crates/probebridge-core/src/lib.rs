//! Core domain for supervising an on-chip debug bridge (OpenOCD).
//!
//! This crate holds everything that is free of process and filesystem side
//! effects: transport kinds, the configuration builder, the output
//! classifier, settings, the error taxonomy and the port traits the runtime
//! adapters implement.

#![deny(unused_crate_dependencies)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;
pub mod transport;

// Re-export commonly used types for convenience
pub use classifier::{ClassifierRule, OutputClassifier, OutputEvent};
pub use config::{BridgeConfig, ConfigError, CustomParams, FtdiParams, JtagParams, TransportParams};
pub use error::{BridgeError, WorkspaceError};
pub use events::{SupervisorSnapshot, SupervisorState};
pub use ports::{
    BridgeSettingsPort, DebugSessionPort, LogChannelPort, LogLevel, NoopDebugSession,
    NoopNotifier, NotifierPort, Severity, WorkspacePort,
};
pub use settings::{
    BridgeSettings, DEFAULT_ADAPTER_SPEED_KHZ, PortSetting, SettingsError, SettingsScope,
    SettingsUpdate, validate_settings,
};
pub use transport::TransportKind;

#[cfg(test)]
use mockall as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tokio as _;
