//! Port definitions (trait abstractions) for the supervisor's collaborators.
//!
//! Ports define the interfaces the supervisor expects from its host. They
//! contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process handles or OS types in any signature
//! - All ports are `Send + Sync` and used as `Arc<dyn Port>`
//! - Notification and debug-session ports ship a no-op implementation

pub mod debug_session;
pub mod log_channel;
pub mod notifier;
pub mod settings;
pub mod workspace;

pub use debug_session::{DebugSessionPort, NoopDebugSession};
pub use log_channel::{LogChannelPort, LogLevel};
pub use notifier::{NoopNotifier, NotifierPort, Severity};
pub use settings::BridgeSettingsPort;
pub use workspace::WorkspacePort;
