//! Configuration accessor port.

use async_trait::async_trait;

use crate::settings::{BridgeSettings, SettingsError, SettingsScope, SettingsUpdate};

/// Reads and updates bridge settings.
///
/// `load` returns the effective values, with session-scoped values taking
/// precedence over persisted ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgeSettingsPort: Send + Sync {
    async fn load(&self) -> Result<BridgeSettings, SettingsError>;

    /// Apply a partial update to one scope.
    async fn update(&self, scope: SettingsScope, update: SettingsUpdate)
    -> Result<(), SettingsError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PortSetting;

    #[tokio::test]
    async fn mock_settings_port_records_scope() {
        let mut mock = MockBridgeSettingsPort::new();
        mock.expect_update()
            .withf(|scope, update| {
                *scope == SettingsScope::Persisted && update.port == Some(PortSetting::Auto)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        mock.update(SettingsScope::Persisted, SettingsUpdate::port(PortSetting::Auto))
            .await
            .unwrap();
    }
}
