//! Downstream debug session port.

use async_trait::async_trait;

/// The remote-debugger client attached to the bridge.
///
/// The supervisor asks it to stop whenever the bridge goes away so the client
/// does not keep talking to a dead port.
#[async_trait]
pub trait DebugSessionPort: Send + Sync {
    async fn stop_session(&self);
}

/// Used when no debugger client is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDebugSession;

#[async_trait]
impl DebugSessionPort for NoopDebugSession {
    async fn stop_session(&self) {}
}
